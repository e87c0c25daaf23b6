use crate::document_api::DocumentApiStore;
use crate::store::{FilesystemTemplateStore, NoopTemplateStore, StoreError, TemplateStore};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn default_database() -> String {
    "templates_db".into()
}

fn default_collection() -> String {
    "session_templates".into()
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Clone, Default, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum TemplateStoreConfig {
    /// HTTP document API.
    Http {
        url: Url,
        #[serde(default = "default_database")]
        database: String,
        #[serde(default = "default_collection")]
        collection: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// JSON array of template documents on local disk.
    Filesystem { path: PathBuf },
    /// No store; always serve the built-in fallback template.
    #[default]
    None,
}

pub fn get_store(config: &TemplateStoreConfig) -> Result<Arc<dyn TemplateStore>, StoreError> {
    let store: Arc<dyn TemplateStore> = match config {
        TemplateStoreConfig::Http {
            url,
            database,
            collection,
            api_key,
            timeout_secs,
        } => Arc::new(DocumentApiStore::new(
            url,
            database.clone(),
            collection.clone(),
            api_key.clone(),
            Duration::from_secs(*timeout_secs),
        )?),
        TemplateStoreConfig::Filesystem { path } => {
            Arc::new(FilesystemTemplateStore::new(path.clone()))
        }
        TemplateStoreConfig::None => {
            tracing::warn!("No template store configured, serving the fallback template");
            Arc::new(NoopTemplateStore)
        }
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_store_config() {
        let yaml = r#"
type: http
url: https://data.example.com/app/data-api/v1
api_key: secret
"#;
        let config: TemplateStoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            TemplateStoreConfig::Http {
                url: Url::parse("https://data.example.com/app/data-api/v1").unwrap(),
                database: "templates_db".into(),
                collection: "session_templates".into(),
                api_key: Some("secret".into()),
                timeout_secs: 5,
            }
        );
        assert!(get_store(&config).is_ok());
    }

    #[test]
    fn test_other_store_configs() {
        let config: TemplateStoreConfig =
            serde_yaml::from_str("type: filesystem\npath: /etc/clickgate/templates.json").unwrap();
        assert_eq!(
            config,
            TemplateStoreConfig::Filesystem {
                path: "/etc/clickgate/templates.json".into()
            }
        );

        let config: TemplateStoreConfig = serde_yaml::from_str("type: none").unwrap();
        assert_eq!(config, TemplateStoreConfig::None);
    }

    #[test]
    fn test_invalid_store_configs() {
        assert!(serde_yaml::from_str::<TemplateStoreConfig>("type: mongodb").is_err());
        assert!(serde_yaml::from_str::<TemplateStoreConfig>("type: http\nurl: not-a-url").is_err());
        assert!(serde_yaml::from_str::<TemplateStoreConfig>("type: filesystem").is_err());
    }
}
