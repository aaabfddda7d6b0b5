//! Conversation turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::response::Citation;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The questioner
    User,
    /// The grounded answerer
    Assistant,
}

impl Role {
    /// Label used in prompts and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation, with any citations attached. Append-only:
/// turns are never rewritten once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub role: Role,
    /// Message text
    pub text: String,
    /// Citations attached to an assistant turn; empty for user turns
    pub citations: Vec<Citation>,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Record a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            citations: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Record an assistant turn with its citations
    pub fn assistant(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            citations,
            timestamp: Utc::now(),
        }
    }
}
