//! Question-answering backend abstraction
//!
//! The backend is an external collaborator reached over a single HTTP
//! endpoint. Everything the session needs from it goes through [`QaService`].

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpQaService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for question-answering backends
#[async_trait]
pub trait QaService: Send + Sync {
    /// Ask one question; `Err` only for transport-level failures
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError>;

    /// Where requests are sent, for logs and user-facing messages
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: QaService + ?Sized> QaService for Arc<T> {
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        (**self).ask(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for backend services
pub struct LoggingService<S> {
    inner: S,
}

impl<S: QaService> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: QaService> QaService for LoggingService<S> {
    async fn ask(&self, request: &AskRequest) -> Result<BackendReply, BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.ask(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    input_chars = request.input.chars().count(),
                    answered = reply.is_answered(),
                    "Backend request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = %e.kind.label(),
                    "Backend request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
