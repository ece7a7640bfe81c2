//! Wire types for the question-answering endpoint
//!
//! The endpoint's reply is duck-typed JSON. It is parsed into [`AskResponse`]
//! and immediately folded into the two-variant [`BackendReply`], so the rest
//! of the crate never inspects raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Assistant text used when the backend declines without a message
pub const FALLBACK_REPLY: &str = "I couldn't generate a response. Please try again.";

const SUCCESS_STATUS: &str = "success";

/// Request body for `POST /medical`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    #[serde(rename = "input_")]
    pub input: String,
}

impl AskRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Response body as the backend sends it
#[derive(Debug, Deserialize)]
pub(crate) struct AskResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

impl AskResponse {
    /// Fold the status discriminator into a tagged reply.
    ///
    /// Anything other than the string `"success"` (including a missing or
    /// non-string status) is a backend-reported failure. A success without
    /// a `response` field has nothing to show, so it is treated the same way.
    pub(crate) fn into_reply(self) -> BackendReply {
        let succeeded = matches!(&self.status, Some(Value::String(s)) if s == SUCCESS_STATUS);
        if !succeeded {
            let message = match self.message {
                Some(Value::String(m)) if !m.is_empty() => Some(m),
                _ => None,
            };
            return BackendReply::Declined { message };
        }

        match self.response {
            Some(Value::String(text)) => BackendReply::Answered(ReplyPayload::Text(text)),
            Some(value) => BackendReply::Answered(ReplyPayload::Structured(value)),
            None => BackendReply::Declined { message: None },
        }
    }
}

/// Answer payload of a successful reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    /// Plain string, shown verbatim
    Text(String),
    /// Any other JSON value, shown as indented JSON
    Structured(Value),
}

impl ReplyPayload {
    pub fn render(&self) -> String {
        match self {
            ReplyPayload::Text(text) => text.clone(),
            ReplyPayload::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// A well-formed reply from the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// Status discriminator signalled success
    Answered(ReplyPayload),
    /// Backend could not produce an answer; optional human-readable reason
    Declined { message: Option<String> },
}

impl BackendReply {
    #[allow(dead_code)] // Constructor for tests and mocks
    pub fn answered_text(text: impl Into<String>) -> Self {
        BackendReply::Answered(ReplyPayload::Text(text.into()))
    }

    #[allow(dead_code)] // Constructor for tests and mocks
    pub fn declined(message: Option<&str>) -> Self {
        BackendReply::Declined {
            message: message.map(str::to_string),
        }
    }

    /// Text of the assistant turn this reply produces
    pub fn display_text(&self) -> String {
        match self {
            BackendReply::Answered(payload) => payload.render(),
            BackendReply::Declined { message } => message
                .clone()
                .unwrap_or_else(|| FALLBACK_REPLY.to_string()),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, BackendReply::Answered(_))
    }
}
