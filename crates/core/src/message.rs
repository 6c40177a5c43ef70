//! Conversation value types.
//!
//! The client owns the turn list and sends all of it with every request:
//! Client history → History normalizer → Transcript + pending turn → Provider.

use serde::{Deserialize, Serialize};

/// Who authored a turn on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The end user
    User,
    /// The assistant
    Assistant,
}

/// A single client-held conversation turn. Order of a `Vec<ConversationTurn>`
/// is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Speaker labels used by the completion service's turn-taking format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Model => "model",
        }
    }
}

impl From<TurnRole> for Speaker {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Speaker::User,
            TurnRole::Assistant => Speaker::Model,
        }
    }
}

/// One prior turn in provider format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Prior turns plus the most recent turn awaiting a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedHistory {
    /// Every turn except the pending one, in original order.
    pub transcript: Vec<TranscriptEntry>,
    /// Text of the final turn, to be merged with the context block.
    pub pending_user_text: String,
}
