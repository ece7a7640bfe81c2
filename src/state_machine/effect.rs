//! Effects produced by state transitions

use super::state::Generation;
use crate::backend::AskRequest;
use crate::conversation::{ErrorDescriptor, Role};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a new turn to the conversation
    AppendTurn { role: Role, text: String },

    /// Toggle the busy flag
    SetPending(bool),

    /// Record or clear the last transport error
    SetError(Option<ErrorDescriptor>),

    /// Issue the single backend request for this cycle
    RequestBackend {
        generation: Generation,
        request: AskRequest,
    },

    /// Return the conversation to its seeded state
    ResetConversation,
}

impl Effect {
    pub fn user_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}
