// ── Conversation Buffer ────────────────────────────────────────────────────
// Rolling window of recent lines plus the trigger counter for one chat.
//
// Firing a batch resets the counter and threshold but keeps the window, so
// the next batch still sees the context that preceded it.

use std::collections::VecDeque;

/// Maximum lines retained per chat. Oldest lines are evicted first.
pub const WINDOW_CAPACITY: usize = 30;

#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    window: VecDeque<String>,
    counter: u32,
    threshold: u32,
}

impl ConversationBuffer {
    pub fn new(threshold: u32) -> Self {
        ConversationBuffer {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            counter: 0,
            threshold,
        }
    }

    /// Append one formatted line and count it toward the next batch.
    pub fn append(&mut self, line: String) {
        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(line);
        self.counter = self.counter.saturating_add(1);
    }

    /// Clear the counter and install a new threshold. The window is untouched.
    pub fn reset_after_fire(&mut self, new_threshold: u32) {
        self.counter = 0;
        self.threshold = new_threshold;
    }

    pub fn snapshot_window(&self) -> Vec<String> {
        self.window.iter().cloned().collect()
    }

    /// Snapshot and reset as one step. Callers hold the chat's lock across this.
    pub fn take_batch(&mut self, new_threshold: u32) -> Vec<String> {
        let lines = self.snapshot_window();
        self.reset_after_fire(new_threshold);
        lines
    }

    /// Replace the pending threshold without touching the counter (mood change).
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> ConversationBuffer {
        let mut buf = ConversationBuffer::new(1_000);
        for i in 1..=n {
            buf.append(format!("u: m{i}"));
        }
        buf
    }

    #[test]
    fn append_counts_and_keeps_order() {
        let buf = filled(3);
        assert_eq!(buf.counter(), 3);
        assert_eq!(buf.snapshot_window(), vec!["u: m1", "u: m2", "u: m3"]);
    }

    #[test]
    fn thirty_first_line_evicts_only_the_oldest() {
        let mut buf = filled(WINDOW_CAPACITY);
        assert_eq!(buf.snapshot_window().len(), WINDOW_CAPACITY);

        buf.append("u: m31".into());
        let window = buf.snapshot_window();
        assert_eq!(window.len(), WINDOW_CAPACITY);
        assert_eq!(window.first().map(String::as_str), Some("u: m2"));
        assert_eq!(window.last().map(String::as_str), Some("u: m31"));
        let expected: Vec<String> = (2..=31).map(|i| format!("u: m{i}")).collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn reset_after_fire_keeps_window() {
        let mut buf = filled(5);
        buf.reset_after_fire(12);
        assert_eq!(buf.counter(), 0);
        assert_eq!(buf.threshold(), 12);
        assert_eq!(buf.snapshot_window().len(), 5);
    }

    #[test]
    fn take_batch_snapshots_before_reset() {
        let mut buf = filled(4);
        let lines = buf.take_batch(7);
        assert_eq!(lines.len(), 4);
        assert_eq!(buf.counter(), 0);
        assert_eq!(buf.threshold(), 7);

        buf.append("u: m5".into());
        let next = buf.take_batch(7);
        assert_eq!(next, vec!["u: m1", "u: m2", "u: m3", "u: m4", "u: m5"]);
    }

    #[test]
    fn set_threshold_leaves_counter() {
        let mut buf = filled(3);
        buf.set_threshold(2);
        assert_eq!(buf.counter(), 3);
        assert_eq!(buf.threshold(), 2);
    }
}
