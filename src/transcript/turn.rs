//! A single turn in a conversation transcript.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Assistant,
}

/// One message in a conversation transcript.
///
/// A human turn and its paired assistant turn share the same `order`. The
/// assistant turn is created empty with `thinking = true` and mutated in
/// place while its exchange streams; finalization freezes the text and
/// clears `thinking`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub order: u64,
    #[serde(default)]
    pub thinking: bool,
    pub model_name: String,
}

impl Turn {
    /// A finalized human turn.
    pub fn human(text: impl Into<String>, order: u64, model_name: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            text: text.into(),
            order,
            thinking: false,
            model_name: model_name.into(),
        }
    }

    /// An empty assistant turn awaiting its first streamed chunk.
    pub fn assistant_thinking(order: u64, model_name: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: String::new(),
            order,
            thinking: true,
            model_name: model_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_turn_is_finalized() {
        let turn = Turn::human("hello", 1, "m");
        assert_eq!(turn.role, Role::Human);
        assert_eq!(turn.text, "hello");
        assert!(!turn.thinking);
    }

    #[test]
    fn test_assistant_turn_starts_thinking_and_empty() {
        let turn = Turn::assistant_thinking(3, "m");
        assert_eq!(turn.role, Role::Assistant);
        assert!(turn.text.is_empty());
        assert!(turn.thinking);
        assert_eq!(turn.order, 3);
    }

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Human).unwrap(), "\"human\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_turn_json_roundtrip() {
        let turn = Turn::assistant_thinking(7, "gpt-4o");
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
