use redirect::config::Config as RedirectConfig;
use serde::Deserialize;
use std::fs::File;

fn default_log_level() -> String {
    "info".into()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "clickgate".into()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json: false,
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub redirect: RedirectConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution::config::TemplateStoreConfig;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            logging:
                level: debug
                json: true
                sentry_dsn: https://key@sentry.example.com/1
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            redirect:
                listener:
                    host: 0.0.0.0
                    port: 2217
                admin_listener:
                    host: 127.0.0.1
                    port: 2218
                session_service:
                    url: https://sessions.internal/sec-session-identity-api/v1
                    timeout_secs: 3
                template_store:
                    type: http
                    url: https://data.example.com/app/data-api/v1
                    collection: templates
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.common.logging.level, "debug");
        assert!(config.common.logging.json);
        assert_eq!(
            config.common.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125,
                prefix: "clickgate".into(),
            })
        );
        assert_eq!(config.redirect.session_service.timeout_secs, 3);
        assert!(matches!(
            config.redirect.template_store,
            TemplateStoreConfig::Http { ref collection, .. } if collection == "templates"
        ));
        assert!(config.redirect.validate().is_ok());
    }

    #[test]
    fn minimal_config() {
        let yaml = r#"
            redirect:
                listener: {host: 0.0.0.0, port: 2217}
                admin_listener: {host: 127.0.0.1, port: 2218}
                session_service: {url: "http://127.0.0.1:2001"}
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.common, CommonConfig::default());
        assert_eq!(config.redirect.template_store, TemplateStoreConfig::None);
    }

    #[test]
    fn config_errors() {
        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/clickgate.yaml")),
            Err(ConfigError::LoadError(_))
        ));

        let tmp = write_tmp_file("logging:\n    level: info\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
