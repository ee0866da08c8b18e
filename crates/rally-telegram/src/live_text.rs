//! Last text the bot itself wrote into each rally message.
//!
//! A callback carries the message text as it was when the button was
//! pressed. Presses queued behind an edit still carry the pre-edit text, so
//! the dispatcher prefers what it last rendered over that snapshot.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Identifies one message: `(chat_id, message_id)`.
pub type MessageKey = (i64, i32);

/// Bounded map of message to last rendered text; the oldest message is
/// forgotten first.
#[derive(Debug)]
pub struct LiveText {
    capacity: usize,
    inner: Mutex<Cells>,
}

#[derive(Debug, Default)]
struct Cells {
    texts: HashMap<MessageKey, String>,
    order: VecDeque<MessageKey>,
}

impl LiveText {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Cells::default()),
        }
    }

    /// The text to apply a press to: the last rendered text if known,
    /// else the snapshot the callback carried.
    pub fn current(&self, key: MessageKey, snapshot: &str) -> String {
        let cells = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cells
            .texts
            .get(&key)
            .cloned()
            .unwrap_or_else(|| snapshot.to_string())
    }

    pub fn store(&self, key: MessageKey, text: String) {
        let mut cells = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if cells.texts.insert(key, text).is_none() {
            cells.order.push_back(key);
        }
        while cells.texts.len() > self.capacity {
            let Some(oldest) = cells.order.pop_front() else {
                break;
            };
            cells.texts.remove(&oldest);
        }
    }

    pub fn evict(&self, key: MessageKey) {
        let mut cells = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if cells.texts.remove(&key).is_some() {
            cells.order.retain(|k| *k != key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .texts
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_snapshot_for_unknown_message() {
        let live = LiveText::new(4);
        assert_eq!(live.current((1, 1), "snapshot"), "snapshot");
    }

    #[test]
    fn stored_text_wins_over_snapshot() {
        let live = LiveText::new(4);
        live.store((1, 1), "rendered".to_string());
        assert_eq!(live.current((1, 1), "stale"), "rendered");
        assert_eq!(live.current((1, 2), "other"), "other");
    }

    #[test]
    fn oldest_message_is_forgotten_past_capacity() {
        let live = LiveText::new(2);
        live.store((1, 1), "a".to_string());
        live.store((1, 2), "b".to_string());
        live.store((1, 1), "a2".to_string());
        live.store((1, 3), "c".to_string());
        assert_eq!(live.len(), 2);
        assert_eq!(live.current((1, 1), "gone"), "gone");
        assert_eq!(live.current((1, 3), "x"), "c");
    }

    #[test]
    fn evict_drops_the_cell() {
        let live = LiveText::new(2);
        live.store((1, 1), "a".to_string());
        live.evict((1, 1));
        assert!(live.is_empty());
        assert_eq!(live.current((1, 1), "snapshot"), "snapshot");
    }
}
