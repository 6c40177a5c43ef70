//! Prompt composer: merges the context block into the pending user turn.

use crate::context::ContextSnapshot;
use edupilot_core::message::RenderedHistory;

/// The rendered block (empty without a snapshot) immediately followed by the
/// pending turn. The block already ends in a blank line.
pub fn compose(snapshot: Option<&ContextSnapshot>, rendered: &RenderedHistory) -> String {
    let block = snapshot.map(ContextSnapshot::render).unwrap_or_default();
    format!("{block}{}", rendered.pending_user_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::normalize;
    use edupilot_core::message::ConversationTurn;
    use serde_json::json;

    #[test]
    fn no_snapshot_yields_pending_text_only() {
        let rendered = normalize(&[ConversationTurn::user("Hi")]).unwrap();
        assert_eq!(compose(None, &rendered), "Hi");
    }

    #[test]
    fn context_block_is_prepended() {
        let snapshot = ContextSnapshot::build(&json!({
            "role": "Student",
            "name": "Asha",
            "attendance": 92,
            "riskScore": "Low",
            "subjects": [{"name": "Math", "score": 88}]
        }));
        let rendered = normalize(&[ConversationTurn::user("How am I doing?")]).unwrap();

        let prompt = compose(Some(&snapshot), &rendered);
        assert!(prompt.starts_with("[CURRENT CONTEXT DATA]\n"));
        assert!(prompt.contains("\nAttendance: 92%\n"));
        assert!(prompt.contains("\n- Math: 88\n"));
        assert!(prompt.ends_with("\n\nHow am I doing?"));
        assert_eq!(prompt, format!("{}How am I doing?", snapshot.render()));
    }

    #[test]
    fn prior_turns_are_not_touched() {
        let turns = vec![
            ConversationTurn::user("Earlier question"),
            ConversationTurn::assistant("Earlier answer"),
            ConversationTurn::user("Now"),
        ];
        let rendered = normalize(&turns).unwrap();
        let prompt = compose(Some(&ContextSnapshot::placeholder()), &rendered);

        assert!(!prompt.contains("Earlier"));
        assert_eq!(rendered.transcript[0].text, "Earlier question");
    }
}
