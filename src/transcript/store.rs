//! In-memory ordered log of conversation turns.
//!
//! Pure data, no I/O. The orchestrator owns the store and is its sole
//! writer; the streaming session reaches it through the orchestrator's
//! shared handle.

use crate::transcript::turn::{Role, Turn};

/// How streamed text is applied to the assistant turn.
///
/// Fixed for the lifetime of one streaming session and chosen by the
/// session's caller, not by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Each chunk replaces the assistant turn's text.
    #[default]
    Replace,
    /// Each chunk is appended to the assistant turn's text.
    Incremental,
}

/// Ordered log of conversation turns.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from previously persisted turns.
    ///
    /// Replaces any existing content; `next_order` continues from the
    /// maximum persisted order.
    pub fn load(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    /// Order value for the next turn pair: max existing order + 1, else 1.
    pub fn next_order(&self) -> u64 {
        self.turns.iter().map(|t| t.order).max().map_or(1, |o| o + 1)
    }

    /// Append a finalized human turn and an empty, thinking assistant turn.
    ///
    /// Both turns share the next order value. Returns the index of the
    /// assistant turn, the target for streamed updates.
    pub fn append_pair(
        &mut self,
        human_text: impl Into<String>,
        model_name: impl Into<String>,
    ) -> usize {
        let order = self.next_order();
        let model_name = model_name.into();
        self.turns
            .push(Turn::human(human_text, order, model_name.clone()));
        self.turns.push(Turn::assistant_thinking(order, model_name));
        self.turns.len() - 1
    }

    /// Apply streamed text to the last assistant turn and clear `thinking`.
    pub fn update_last(&mut self, text: &str, mode: UpdateMode) {
        if let Some(turn) = self.last_assistant_mut() {
            match mode {
                UpdateMode::Replace => turn.text = text.to_string(),
                UpdateMode::Incremental => turn.text.push_str(text),
            }
            turn.thinking = false;
        }
    }

    /// Freeze a turn: its text stops mutating and `thinking` is cleared.
    pub fn finalize(&mut self, index: usize) {
        if let Some(turn) = self.turns.get_mut(index) {
            turn.thinking = false;
        }
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Text of the last assistant turn, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }

    fn last_assistant_mut(&mut self) -> Option<&mut Turn> {
        self.turns
            .iter_mut()
            .rev()
            .find(|t| t.role == Role::Assistant)
    }
}
