//! Session runtime
//!
//! Executes the effects produced by the submitter state machine against the
//! conversation store and the question-answering backend.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{ConversationSession, SubmitOutcome};

use crate::backend::{HttpQaService, LoggingService};

/// Session wired to the real HTTP backend
pub type ProductionSession = ConversationSession<LoggingService<HttpQaService>>;
