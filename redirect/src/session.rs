use crate::config::SessionServiceConfig;
use crate::metrics_defs::{SESSION_REGISTRATION_DURATION, SESSION_REGISTRATION_FALLBACK};
use attribution::CanonicalPayload;
use http::StatusCode;
use serde::Deserialize;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use uuid::Uuid;

const TRANSACTION_ID_HEADER: &str = "X-External-Transaction-Id";
const CHANNEL_HEADER: &str = "X-Channel";

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("session service timed out")]
    Timeout,
    #[error("could not connect to session service")]
    Connect,
    #[error("session service returned status {0}")]
    Status(StatusCode),
    #[error("unexpected session service response: {0}")]
    Decode(String),
    #[error("session service request failed: {0}")]
    Request(String),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Timeout => "timeout",
            SessionError::Connect => "connect",
            SessionError::Status(_) => "status",
            SessionError::Decode(_) => "decode",
            SessionError::Request(_) => "request",
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SessionError::Timeout
        } else if err.is_connect() {
            SessionError::Connect
        } else if err.is_decode() {
            SessionError::Decode(err.to_string())
        } else {
            SessionError::Request(err.to_string())
        }
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    uid: String,
}

/// Registers click events with the session identity service.
#[derive(Clone)]
pub struct SessionClient {
    client: reqwest::Client,
    session_url: String,
}

impl SessionClient {
    pub fn new(config: &SessionServiceConfig) -> Result<Self, reqwest::Error> {
        let session_url = format!("{}/session", config.url.as_str().trim_end_matches('/'));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(SessionClient {
            client,
            session_url,
        })
    }

    /// Returns the session uid for this click. Never fails: when the session
    /// service cannot be used a locally generated uid is returned instead.
    pub async fn register_click_event(&self, payload: &CanonicalPayload) -> String {
        let start = Instant::now();
        let result = self.try_register(payload).await;
        histogram!(SESSION_REGISTRATION_DURATION).record(start.elapsed().as_secs_f64());

        match result {
            Ok(uid) => {
                tracing::info!("Click event registered");
                uid
            }
            Err(err) => {
                tracing::warn!(error_kind = err.kind(), "Session service fallback");
                counter!(SESSION_REGISTRATION_FALLBACK, "kind" => err.kind()).increment(1);
                Uuid::new_v4().to_string()
            }
        }
    }

    async fn try_register(&self, payload: &CanonicalPayload) -> Result<String, SessionError> {
        let transaction_id = Uuid::new_v4().to_string();

        let response = self
            .client
            .post(&self.session_url)
            .header(TRANSACTION_ID_HEADER, &transaction_id)
            .header(CHANNEL_HEADER, &payload.channel)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status));
        }

        Ok(response.json::<SessionResponse>().await?.uid)
    }
}
