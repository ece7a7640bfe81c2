//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects. All I/O is left to the runtime executing the
//! effects.

use super::state::{CycleOutcome, Generation, UNREACHABLE_BANNER};
use super::{ConvContext, ConvState, Effect, Event};
use crate::backend::{AskRequest, BackendError};
use crate::conversation::ErrorDescriptor;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
    /// Set when this transition finished a request cycle
    pub outcome: Option<CycleOutcome>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
            outcome: None,
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: CycleOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Events the current state refuses. None of these are user-facing errors:
/// the caller drops the event and the conversation is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Input is empty after trimming")]
    EmptyInput,
    #[error("A request is already in flight")]
    Busy,
    #[error("Completion for generation {issued} arrived in generation {current}")]
    StaleCompletion {
        issued: Generation,
        current: Generation,
    },
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (*state, event) {
        // ============================================================
        // Submission
        // ============================================================

        // Idle + UserSubmit -> Sending (after validation)
        (ConvState::Idle { generation }, Event::UserSubmit { text }) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            Ok(TransitionResult::new(ConvState::Sending { generation })
                .with_effect(Effect::user_turn(trimmed))
                .with_effect(Effect::SetPending(true))
                .with_effect(Effect::SetError(None))
                .with_effect(Effect::RequestBackend {
                    generation,
                    request: AskRequest::new(trimmed),
                }))
        }

        // One request at a time; not a queue
        (ConvState::Sending { .. }, Event::UserSubmit { .. }) => Err(TransitionError::Busy),

        // ============================================================
        // Completion
        // ============================================================

        // Sending + reply for this generation -> Idle (Succeeded)
        (ConvState::Sending { generation }, Event::BackendReplied { generation: issued, reply })
            if issued == generation =>
        {
            Ok(TransitionResult::new(ConvState::Idle { generation })
                .with_effect(Effect::assistant_turn(reply.display_text()))
                .with_effect(Effect::SetPending(false))
                .with_outcome(CycleOutcome::Succeeded))
        }

        // Sending + transport failure for this generation -> Idle (Failed)
        (ConvState::Sending { generation }, Event::BackendFailed { generation: issued, error })
            if issued == generation =>
        {
            Ok(TransitionResult::new(ConvState::Idle { generation })
                .with_effect(Effect::assistant_turn(context.unreachable_message.clone()))
                .with_effect(Effect::SetError(Some(describe(&error))))
                .with_effect(Effect::SetPending(false))
                .with_outcome(CycleOutcome::Failed))
        }

        // Completion from before a reset, or with nothing outstanding
        (
            current,
            Event::BackendReplied { generation: issued, .. }
            | Event::BackendFailed { generation: issued, .. },
        ) => Err(TransitionError::StaleCompletion {
            issued,
            current: current.generation(),
        }),

        // ============================================================
        // Reset
        // ============================================================

        // Any state + UserReset -> Idle in a fresh generation
        (current, Event::UserReset) => Ok(TransitionResult::new(ConvState::Idle {
            generation: current.generation().next(),
        })
        .with_effect(Effect::ResetConversation)),
    }
}

fn describe(error: &BackendError) -> ErrorDescriptor {
    ErrorDescriptor {
        kind: error.kind,
        banner: UNREACHABLE_BANNER.to_string(),
        detail: error.message.clone(),
    }
}
