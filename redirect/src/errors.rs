use attribution::{StoreError, ValidationError};
use hyper::StatusCode;
use thiserror::Error;

/// Result type alias for redirect gateway operations
pub type Result<T, E = RedirectError> = std::result::Result<T, E>;

/// Errors that can occur while serving the redirect gateway
#[derive(Error, Debug)]
pub enum RedirectError {
    /// Required click parameter missing or malformed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ValidationError),

    #[error("Template store error: {0}")]
    TemplateStore(#[from] StoreError),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RedirectError {
    /// Status code the caller sees for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RedirectError::Validation(_) => StatusCode::BAD_REQUEST,
            RedirectError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller. Internal details stay in the logs.
    pub fn public_detail(&self) -> String {
        match self {
            RedirectError::Validation(err) => err.to_string(),
            RedirectError::MethodNotAllowed => "Method Not Allowed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}
