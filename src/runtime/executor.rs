//! Conversation session executor

use crate::backend::{AskRequest, BackendError, BackendReply, QaService};
use crate::conversation::{ConversationEvent, ConversationStore, ConversationView};
use crate::state_machine::{
    transition, ConvContext, ConvState, CycleOutcome, Effect, Event, Generation, TransitionError,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// What became of one `submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input or a request already in flight; nothing changed
    Ignored,
    /// Backend answered (or declined) and the reply was appended
    Succeeded,
    /// Transport failure; apology appended and last error set
    Failed,
    /// Conversation was reset while the request was in flight
    Discarded,
}

impl From<CycleOutcome> for SubmitOutcome {
    fn from(outcome: CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Succeeded => SubmitOutcome::Succeeded,
            CycleOutcome::Failed => SubmitOutcome::Failed,
        }
    }
}

/// One conversation with one backend.
///
/// Owns the conversation store and the submitter state; the only way to
/// change either is [`submit`](Self::submit) or [`reset`](Self::reset).
/// The lock is never held across the network call.
pub struct ConversationSession<B: QaService> {
    context: ConvContext,
    backend: B,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    state: ConvState,
    store: ConversationStore,
}

/// What a processed event asks the caller to do next
struct Dispatched {
    outcome: Option<CycleOutcome>,
    request: Option<(Generation, AskRequest)>,
}

impl<B: QaService> ConversationSession<B> {
    pub fn new(backend: B) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = ConvContext::new(session_id, backend.endpoint());
        tracing::info!(
            session_id = %context.session_id,
            endpoint = %backend.endpoint(),
            "Starting conversation session"
        );
        Self {
            context,
            backend,
            inner: Mutex::new(SessionInner {
                state: ConvState::default(),
                store: ConversationStore::new(),
            }),
        }
    }

    /// Submit one user turn and wait for its cycle to finish.
    ///
    /// Never fails: rejected input is a silent no-op and every backend
    /// failure ends as an assistant turn. Dropping the returned future
    /// mid-request completes the cycle as a transport failure.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        let (generation, request) = match self.begin(raw_text) {
            Ok(issued) => issued,
            Err(reason) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    reason = %reason,
                    "Ignoring submit"
                );
                return SubmitOutcome::Ignored;
            }
        };

        let guard = CompletionGuard {
            session: self,
            generation,
            armed: true,
        };
        let result = self.backend.ask(&request).await;
        guard.finish(result)
    }

    /// Return to the seeded greeting; any in-flight reply will be dropped
    pub fn reset(&self) {
        let mut inner = self.lock();
        let was_sending = inner.state.is_sending();
        if let Err(e) = inner.process_event(&self.context, Event::UserReset) {
            // Reset is accepted from every state
            tracing::error!(error = %e, "Reset rejected");
            return;
        }
        tracing::info!(
            session_id = %self.context.session_id,
            generation = %inner.state.generation(),
            discarding_in_flight = was_sending,
            "Conversation reset"
        );
    }

    pub fn view(&self) -> ConversationView {
        self.lock().store.view()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.lock().store.subscribe()
    }

    /// Validate and record the user turn; returns the request to issue
    fn begin(&self, raw_text: &str) -> Result<(Generation, AskRequest), TransitionError> {
        let mut inner = self.lock();
        let dispatched = inner.process_event(&self.context, Event::submit(raw_text))?;
        // An accepted submit always issues exactly one request
        let (generation, request) = dispatched.request.ok_or(TransitionError::Busy)?;
        tracing::info!(
            session_id = %self.context.session_id,
            generation = %generation,
            input_chars = request.input.chars().count(),
            "Submitting question"
        );
        Ok((generation, request))
    }

    /// Fold a backend result into the conversation
    fn complete(
        &self,
        generation: Generation,
        result: Result<BackendReply, BackendError>,
    ) -> SubmitOutcome {
        let event = match result {
            Ok(reply) => Event::BackendReplied { generation, reply },
            Err(error) => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    generation = %generation,
                    error = %error,
                    "Backend unreachable"
                );
                Event::BackendFailed { generation, error }
            }
        };
        self.dispatch_completion(event)
    }

    /// Close a cycle whose submit future was dropped before the backend answered
    fn abandon(&self, generation: Generation) -> SubmitOutcome {
        tracing::info!(
            session_id = %self.context.session_id,
            generation = %generation,
            "Submit abandoned"
        );
        self.dispatch_completion(Event::BackendFailed {
            generation,
            error: BackendError::network("Request abandoned before completion"),
        })
    }

    fn dispatch_completion(&self, event: Event) -> SubmitOutcome {
        let mut inner = self.lock();
        match inner.process_event(&self.context, event) {
            Ok(dispatched) => dispatched
                .outcome
                .map_or(SubmitOutcome::Discarded, SubmitOutcome::from),
            Err(e) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    reason = %e,
                    "Discarding stale completion"
                );
                SubmitOutcome::Discarded
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // State is only mutated between whole transitions, so a poisoned
        // lock still guards a consistent conversation
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionInner {
    fn process_event(
        &mut self,
        context: &ConvContext,
        event: Event,
    ) -> Result<Dispatched, TransitionError> {
        // Pure state transition
        let result = transition(&self.state, context, event)?;
        tracing::debug!(
            session_id = %context.session_id,
            from = self.state.name(),
            to = result.new_state.name(),
            "State transition"
        );
        self.state = result.new_state;

        let mut dispatched = Dispatched {
            outcome: result.outcome,
            request: None,
        };
        for effect in result.effects {
            if let Some(request) = self.execute_effect(effect) {
                dispatched.request = Some(request);
            }
        }
        Ok(dispatched)
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<(Generation, AskRequest)> {
        match effect {
            Effect::AppendTurn { role, text } => {
                let turn = self.store.make_turn(role, text);
                tracing::debug!(
                    turn_id = %turn.id(),
                    role = %role,
                    created_at = %turn.created_at(),
                    "Appending turn"
                );
                self.store.append(turn);
                None
            }
            Effect::SetPending(pending) => {
                self.store.set_pending(pending);
                None
            }
            Effect::SetError(error) => {
                self.store.set_error(error);
                None
            }
            Effect::RequestBackend {
                generation,
                request,
            } => Some((generation, request)),
            Effect::ResetConversation => {
                self.store.reset();
                None
            }
        }
    }
}

/// Completes the cycle even if the submit future is dropped mid-request
struct CompletionGuard<'a, B: QaService> {
    session: &'a ConversationSession<B>,
    generation: Generation,
    armed: bool,
}

impl<B: QaService> CompletionGuard<'_, B> {
    fn finish(mut self, result: Result<BackendReply, BackendError>) -> SubmitOutcome {
        self.armed = false;
        self.session.complete(self.generation, result)
    }
}

impl<B: QaService> Drop for CompletionGuard<'_, B> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon(self.generation);
        }
    }
}
