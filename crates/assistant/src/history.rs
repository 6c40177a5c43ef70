//! History normalizer: reshapes the client's turn list into the provider's
//! transcript format and isolates the pending turn.

use edupilot_core::error::ChatError;
use edupilot_core::message::{ConversationTurn, RenderedHistory, TranscriptEntry, TurnRole};
use tracing::warn;

/// What to do when the final turn was not authored by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Use the final turn's text as the pending turn regardless of its role.
    #[default]
    Lenient,
    /// Reject the history with `ChatError::InvalidHistory`.
    Strict,
}

/// Normalize with the lenient policy.
pub fn normalize(turns: &[ConversationTurn]) -> Result<RenderedHistory, ChatError> {
    normalize_with(turns, HistoryPolicy::Lenient)
}

/// Split `turns` into a transcript of every turn but the last, in order,
/// and the last turn's text as the pending turn.
///
/// `transcript.len() + 1 == turns.len()` for every successful call.
pub fn normalize_with(
    turns: &[ConversationTurn],
    policy: HistoryPolicy,
) -> Result<RenderedHistory, ChatError> {
    let Some((last, prior)) = turns.split_last() else {
        return Err(ChatError::EmptyHistory);
    };

    if last.role != TurnRole::User {
        match policy {
            HistoryPolicy::Strict => {
                return Err(ChatError::InvalidHistory(
                    "the last turn must be authored by the user".into(),
                ));
            }
            HistoryPolicy::Lenient => {
                warn!(
                    turns = turns.len(),
                    "Last turn is not a user turn; sending its text as the pending turn"
                );
            }
        }
    }

    let transcript = prior
        .iter()
        .map(|turn| TranscriptEntry {
            speaker: turn.role.into(),
            text: turn.content.clone(),
        })
        .collect();

    Ok(RenderedHistory {
        transcript,
        pending_user_text: last.content.clone(),
    })
}
