//! Backend error types

use thiserror::Error;

/// Transport-level failure talking to the question-answering backend.
///
/// A backend that answers with a well-formed "error" status is not a
/// `BackendError`; that case is a [`super::BackendReply::Declined`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Timeout, message)
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::HttpStatus(status), message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::MalformedPayload, message)
    }
}

/// Error classification, carried into the conversation's last-error descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Connection refused, DNS failure, reset mid-body
    Network,
    /// Client-side timeout elapsed
    Timeout,
    /// Any non-2xx response, regardless of body
    HttpStatus(u16),
    /// 2xx response whose body is not the expected JSON shape
    MalformedPayload,
}

impl BackendErrorKind {
    pub fn label(self) -> String {
        match self {
            Self::Network => "network".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::HttpStatus(status) => format!("http {status}"),
            Self::MalformedPayload => "malformed payload".to_string(),
        }
    }
}
