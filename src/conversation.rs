//! Conversation store
//!
//! Single source of truth for the turn history and the busy/error flags.
//! Pure in-memory state: every mutation is broadcast to subscribers, nothing
//! here performs I/O or waits.

mod turn;

pub use turn::{Role, Turn, TurnId, GREETING};

use crate::backend::BackendErrorKind;
use tokio::sync::broadcast;

const NOTIFY_CAPACITY: usize = 128;

/// Transport failure surfaced next to the conversation (e.g. as a banner)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub kind: BackendErrorKind,
    /// Short user-facing text
    pub banner: String,
    /// Diagnostic detail from the transport layer
    pub detail: String,
}

/// Read-only snapshot handed across the rendering boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub turns: Vec<Turn>,
    pub pending: bool,
    pub last_error: Option<ErrorDescriptor>,
}

/// Change notifications, one per observable mutation
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    TurnAppended(Turn),
    PendingChanged(bool),
    ErrorChanged(Option<ErrorDescriptor>),
    Reset(ConversationView),
}

pub struct ConversationStore {
    turns: Vec<Turn>,
    pending: bool,
    last_error: Option<ErrorDescriptor>,
    /// Next id to hand out; keeps counting across resets
    next_id: u64,
    notify_tx: broadcast::Sender<ConversationEvent>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            turns: vec![Turn::greeting()],
            pending: false,
            last_error: None,
            next_id: TurnId::GREETING.as_u64() + 1,
            notify_tx,
        }
    }

    /// Build a turn with a fresh id. Does not append it.
    pub fn make_turn(&mut self, role: Role, text: impl Into<String>) -> Turn {
        let id = TurnId::new(self.next_id);
        self.next_id += 1;
        Turn::new(id, role, text.into())
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn.clone());
        self.emit(ConversationEvent::TurnAppended(turn));
    }

    pub fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.emit(ConversationEvent::PendingChanged(pending));
        }
    }

    pub fn set_error(&mut self, error: Option<ErrorDescriptor>) {
        if self.last_error != error {
            self.last_error.clone_from(&error);
            self.emit(ConversationEvent::ErrorChanged(error));
        }
    }

    /// Back to the seeded greeting with both flags cleared
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::greeting());
        self.pending = false;
        self.last_error = None;
        self.emit(ConversationEvent::Reset(self.view()));
    }

    #[allow(dead_code)] // API completeness; renderers use view()
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[allow(dead_code)] // API completeness; renderers use view()
    pub fn pending(&self) -> bool {
        self.pending
    }

    #[allow(dead_code)] // API completeness; renderers use view()
    pub fn last_error(&self) -> Option<&ErrorDescriptor> {
        self.last_error.as_ref()
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            turns: self.turns.clone(),
            pending: self.pending,
            last_error: self.last_error.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.notify_tx.subscribe()
    }

    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine
        let _ = self.notify_tx.send(event);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
