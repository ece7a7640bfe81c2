//! HTTP implementation of the question-answering backend

use super::types::{AskRequest, AskResponse, BackendReply};
use super::{BackendError, QaService};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::Client;

/// Endpoint path appended to the configured base URL
pub const ENDPOINT_PATH: &str = "/medical";

/// Longest slice of an unparsable body kept in error messages
const BODY_EXCERPT_CHARS: usize = 200;

/// reqwest-backed service for `POST <base>/medical`
pub struct HttpQaService {
    client: Client,
    endpoint: String,
}

impl HttpQaService {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{ENDPOINT_PATH}", config.base_url.trim_end_matches('/')),
        })
    }

    fn classify_send_error(e: &reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            BackendError::network(format!("Connection failed: {e}"))
        } else {
            BackendError::network(format!("Request failed: {e}"))
        }
    }
}

#[async_trait]
impl QaService for HttpQaService {
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::http_status(
                status.as_u16(),
                format!("Backend returned status {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let parsed: AskResponse = serde_json::from_str(&body).map_err(|e| {
            BackendError::malformed(format!(
                "Failed to parse response: {e} - body: {}",
                excerpt(&body)
            ))
        })?;

        Ok(parsed.into_reply())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
