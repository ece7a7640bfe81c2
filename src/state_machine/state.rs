//! Submitter state types

use std::fmt;

/// Banner shown next to the conversation after a transport failure
pub const UNREACHABLE_BANNER: &str = "Could not reach the backend. Check if the server is running.";

/// Conversation epoch; bumped by every reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Submitter State
// ============================================================================

/// Request lifecycle of a session.
///
/// Validation and the terminal `Succeeded`/`Failed` steps are instantaneous,
/// so only the two resting states are stored; the terminal step taken is
/// reported as a [`CycleOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvState {
    /// Ready for user input
    Idle { generation: Generation },

    /// One backend request in flight, issued against `generation`
    Sending { generation: Generation },
}

impl Default for ConvState {
    fn default() -> Self {
        ConvState::Idle {
            generation: Generation::default(),
        }
    }
}

impl ConvState {
    pub fn generation(&self) -> Generation {
        match self {
            ConvState::Idle { generation } | ConvState::Sending { generation } => *generation,
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, ConvState::Sending { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle { .. } => "idle",
            ConvState::Sending { .. } => "sending",
        }
    }
}

/// How a request cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Backend answered or declined; either way it produced a turn
    Succeeded,
    /// Transport failure
    Failed,
}

/// Per-session configuration (immutable)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    /// Assistant turn text after a transport failure
    pub unreachable_message: String,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>, endpoint: &str) -> Self {
        Self {
            session_id: session_id.into(),
            unreachable_message: unreachable_message(endpoint),
        }
    }
}

/// Apology appended as the assistant turn when the backend cannot be reached
pub fn unreachable_message(endpoint: &str) -> String {
    format!(
        "There was a problem contacting the server. Please make sure the backend is running on {endpoint}."
    )
}
