use attribution::config::TemplateStoreConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("API prefix must start with '/': {0}")]
    InvalidApiPrefix(String),

    #[error("Destination phone number must be digits only: {0:?}")]
    InvalidPhoneNumber(String),

    #[error("Session service timeout cannot be 0")]
    InvalidTimeout,
}

/// Redirect gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceInfo,
    /// Public listener for click redirects
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Prefix of the public API routes, e.g. `/market-ads-attribution-api/v1`
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    pub session_service: SessionServiceConfig,
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub template_store: TemplateStoreConfig,
}

fn default_api_prefix() -> String {
    "/market-ads-attribution-api/v1".into()
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if !self.api_prefix.starts_with('/') {
            return Err(ValidationError::InvalidApiPrefix(self.api_prefix.clone()));
        }

        if self.session_service.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        self.destination.validate()
    }

    /// The API prefix without a trailing slash, empty for `/`.
    pub fn route_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }
}

/// Name and version reported by the root and health endpoints
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        ServiceInfo {
            name: "market-ads-attribution".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Session identity service that click events are registered with
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SessionServiceConfig {
    /// Base URL; events are posted to `{url}/session`
    pub url: Url,
    #[serde(default = "default_session_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_session_timeout_secs() -> u64 {
    5
}

/// Messaging destination every click is redirected to
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DestinationConfig {
    /// International number without `+`, e.g. "593968600400"
    pub phone_number: String,
    /// Prefilled message text
    pub message: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        DestinationConfig {
            phone_number: "593968600400".into(),
            message: "Hola quiero más información".into(),
        }
    }
}

impl DestinationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phone_number.is_empty() || !self.phone_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidPhoneNumber(
                self.phone_number.clone(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base_config() -> Config {
        Config {
            service: ServiceInfo::default(),
            listener: Listener {
                host: "0.0.0.0".to_string(),
                port: 2217,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 2218,
            },
            api_prefix: default_api_prefix(),
            session_service: SessionServiceConfig {
                url: Url::parse("http://127.0.0.1:2001/sec-session-identity-api/v1").unwrap(),
                timeout_secs: 5,
            },
            destination: DestinationConfig::default(),
            template_store: TemplateStoreConfig::None,
        }
    }

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
service:
    name: market-ads-attribution
    version: 1.2.0
listener:
    host: "0.0.0.0"
    port: 2217
admin_listener:
    host: "127.0.0.1"
    port: 2218
api_prefix: /ads/v1
session_service:
    url: "https://sessions.internal:2001/sec-session-identity-api/v1"
destination:
    phone_number: "593900000000"
    message: "Hello"
template_store:
    type: filesystem
    path: /etc/clickgate/templates.json
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.service.version, "1.2.0");
        assert_eq!(config.listener.port, 2217);
        assert_eq!(config.api_prefix, "/ads/v1");
        assert_eq!(config.session_service.timeout_secs, 5);
        assert_eq!(config.destination.phone_number, "593900000000");
        assert_eq!(
            config.template_store,
            TemplateStoreConfig::Filesystem {
                path: PathBuf::from("/etc/clickgate/templates.json")
            }
        );
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 2217}
admin_listener: {host: "127.0.0.1", port: 2218}
session_service: {url: "http://127.0.0.1:2001"}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_prefix, "/market-ads-attribution-api/v1");
        assert_eq!(config.destination, DestinationConfig::default());
        assert_eq!(config.template_store, TemplateStoreConfig::None);
        assert_eq!(config.service.name, "market-ads-attribution");
    }

    #[test]
    fn test_route_prefix() {
        let mut config = base_config();
        assert_eq!(config.route_prefix(), "/market-ads-attribution-api/v1");

        config.api_prefix = "/ads/".into();
        assert_eq!(config.route_prefix(), "/ads");

        config.api_prefix = "/".into();
        assert_eq!(config.route_prefix(), "");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = base_config();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config();
        config.api_prefix = "ads/v1".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidApiPrefix(_)
        ));

        let mut config = base_config();
        config.destination.phone_number = "+593968600400".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPhoneNumber(_)
        ));

        let mut config = base_config();
        config.destination.phone_number = "".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPhoneNumber(_)
        ));

        let mut config = base_config();
        config.session_service.timeout_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidTimeout
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 2217}
admin_listener: {host: "127.0.0.1", port: 2218}
session_service: {url: "not-a-url"}
"#
            )
            .is_err()
        );

        // Missing session service
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 2217}
admin_listener: {host: "127.0.0.1", port: 2218}
"#
            )
            .is_err()
        );

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Listener>(r#"{host: "0.0.0.0", port: "http"}"#).is_err()
        );
    }
}
