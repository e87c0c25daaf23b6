//! Document stores the session template can be loaded from.
//!
//! A store answers `find_one(filter)` with the first matching template, or
//! `None`. Absence is not an error; errors are reserved for a store that
//! could not be reached or returned something that is not a template.
use crate::template::Template;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("template store request timed out")]
    Timeout,

    #[error("could not connect to template store: {0}")]
    Connect(String),

    #[error("template store returned status {0}")]
    Status(u16),

    #[error("template store request failed: {0}")]
    Request(String),

    #[error("malformed template document: {0}")]
    MalformedTemplate(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid template store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Short classification used in logs and metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Timeout => "timeout",
            StoreError::Connect(_) => "connect",
            StoreError::Status(_) => "status",
            StoreError::Request(_) => "request",
            StoreError::MalformedTemplate(_) => "malformed_template",
            StoreError::Io(_) => "io",
            StoreError::InvalidUrl(_) => "invalid_url",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Status(status.as_u16())
        } else if err.is_decode() {
            StoreError::Request(format!("could not decode response: {err}"))
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

/// Exact-match filters the accessor issues, in lookup order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateFilter {
    ActiveById(String),
    ActiveBySource(String),
}

impl TemplateFilter {
    /// The filter as a query document, e.g. `{"_id": "...", "active": true}`.
    pub fn to_document(&self) -> Value {
        match self {
            TemplateFilter::ActiveById(id) => json!({"_id": id, "active": true}),
            TemplateFilter::ActiveBySource(source) => json!({"source": source, "active": true}),
        }
    }

    /// True when every filter field is present in `document` with an equal value.
    pub fn matches(&self, document: &Value) -> bool {
        let Value::Object(filter) = self.to_document() else {
            return false;
        };

        filter
            .iter()
            .all(|(key, expected)| document.get(key) == Some(expected))
    }
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_one(&self, filter: &TemplateFilter) -> Result<Option<Template>, StoreError>;
}

/// Store that never has a template. The gateway then runs on the built-in
/// fallback template.
pub struct NoopTemplateStore;

#[async_trait]
impl TemplateStore for NoopTemplateStore {
    async fn find_one(&self, _filter: &TemplateFilter) -> Result<Option<Template>, StoreError> {
        Ok(None)
    }
}

/// Reads a JSON array of template documents from a local file.
///
/// The file is re-read on every lookup so edits are picked up on the next
/// cache refresh.
pub struct FilesystemTemplateStore {
    path: PathBuf,
}

impl FilesystemTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilesystemTemplateStore { path: path.into() }
    }
}

#[async_trait]
impl TemplateStore for FilesystemTemplateStore {
    async fn find_one(&self, filter: &TemplateFilter) -> Result<Option<Template>, StoreError> {
        let contents = tokio::fs::read(&self.path).await?;
        let documents: Vec<Value> = serde_json::from_slice(&contents)?;

        documents
            .into_iter()
            .find(|document| filter.matches(document))
            .map(Template::from_document)
            .transpose()
            .map_err(StoreError::from)
    }
}
