//! Conversation turns

use chrono::{DateTime, Utc};
use std::fmt;

/// Text of the assistant turn every conversation starts with
pub const GREETING: &str =
    "Hi! I'm your medical assistant. Ask me a question based on the documents I've been trained on 👋";

/// Creation-ordered turn identifier; never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

impl TurnId {
    /// Id carried by the seeded greeting
    pub const GREETING: TurnId = TurnId(0);

    pub(super) fn new(raw: u64) -> Self {
        TurnId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    id: TurnId,
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub(super) fn new(id: TurnId, role: Role, text: String) -> Self {
        Self {
            id,
            role,
            text,
            created_at: Utc::now(),
        }
    }

    pub(super) fn greeting() -> Self {
        Self::new(TurnId::GREETING, Role::Assistant, GREETING.to_string())
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Display text; line breaks are significant
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[allow(dead_code)] // State query utility
    pub fn is_greeting(&self) -> bool {
        self.id == TurnId::GREETING
    }
}
