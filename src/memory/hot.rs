//! Hot memory tier — the last `window_size` messages by `sequence_number`
//! (spec §4.4, default `HOT_WINDOW_SIZE` = 50).
//!
//! Adapted directly from the teacher's `context::truncate_messages`: same
//! "keep system, keep the tail" shape, generalized to order by the
//! orchestrator's own `sequence_number` rather than Vec position (a
//! conversation's full history may arrive out of insertion order from a
//! repository query).

use crate::types::Message;

/// Sliding window over recent turns. Holds no state itself — it is a pure
/// function of the conversation's message list, called fresh each turn by
/// `memory::compose`.
pub struct HotWindow {
    pub window_size: usize,
}

impl HotWindow {
    pub fn new(window_size: usize) -> Self {
        HotWindow { window_size }
    }

    /// Returns the most recent `window_size` messages, ordered by
    /// `sequence_number` ascending. `messages` need not already be sorted.
    pub fn select<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        let mut sorted: Vec<&Message> = messages.iter().collect();
        sorted.sort_by_key(|m| m.sequence_number);
        let start = sorted.len().saturating_sub(self.window_size);
        sorted[start..].to_vec()
    }

    /// The lowest `sequence_number` retained by the window, used by
    /// `memory::warm` to know which messages have aged out and need
    /// summarizing (spec §4.4 "delta messages").
    pub fn oldest_retained_sequence(&self, messages: &[Message]) -> Option<u64> {
        self.select(messages).first().map(|m| m.sequence_number)
    }
}
