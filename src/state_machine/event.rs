//! Events that drive the submitter

use super::state::Generation;
use crate::backend::{BackendError, BackendReply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserSubmit { text: String },
    UserReset,

    // Backend events, tagged with the generation the request was issued in
    BackendReplied {
        generation: Generation,
        reply: BackendReply,
    },
    BackendFailed {
        generation: Generation,
        error: BackendError,
    },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::UserSubmit { text: text.into() }
    }
}
