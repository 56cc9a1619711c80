//! Append-only conversation log.
//!
//! The only retraction allowed is removal of a transient placeholder turn,
//! plus the explicit truncation used when the user re-edits an earlier
//! request.

use crate::conversation::{Part, Timestamp, Turn, TurnClock, PLACEHOLDER_TEXT};

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    turns: Vec<Turn>,
    clock: TurnClock,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
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

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    /// Stamp and append a turn. A turn without parts gets the `"..."`
    /// placeholder so nothing empty ever lands in the log.
    pub fn append(&mut self, mut turn: Turn) -> Timestamp {
        if turn.parts.is_empty() {
            turn.parts.push(Part::text(PLACEHOLDER_TEXT));
        }
        turn.created_at = self.clock.tick();
        let stamp = turn.created_at;
        self.turns.push(turn);
        stamp
    }

    /// Remove the transient turn stamped `stamp`. Non-transient turns are
    /// never removed through here.
    pub fn retract_transient(&mut self, stamp: Timestamp) -> bool {
        match self
            .turns
            .iter()
            .rposition(|t| t.created_at == stamp && t.is_transient)
        {
            Some(index) => {
                self.turns.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop the turn at `index` and everything after it, returning the
    /// removed turn. This discards history for good.
    pub fn truncate_before(&mut self, index: usize) -> Option<Turn> {
        if index >= self.turns.len() {
            return None;
        }
        let removed = self.turns.get(index).cloned();
        self.turns.truncate(index);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_append_substitutes_placeholder() {
        let mut store = MessageStore::new();
        store.append(Turn::user(Vec::new()));
        assert_eq!(store.turns()[0].parts, vec![Part::text("...")]);
    }

    #[test]
    fn test_timestamps_are_unique() {
        let mut store = MessageStore::new();
        let a = store.append(Turn::user(vec![Part::text("a")]));
        let b = store.append(Turn::model_text("b"));
        let c = store.append(Turn::model_text("c"));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_retract_transient_then_append() {
        let mut store = MessageStore::new();
        store.append(Turn::user(vec![Part::text("make a video")]));
        let stamp = store.append(Turn::transient("Processing..."));
        assert!(store.retract_transient(stamp));
        let result = store.append(Turn::model(vec![Part::video("uri")]));

        assert_eq!(store.len(), 2);
        assert!(store.turns().iter().all(|t| !t.is_transient));
        assert_eq!(store.turns()[1].role, Role::Model);
        assert!(result > stamp);
    }

    #[test]
    fn test_retract_ignores_regular_turns() {
        let mut store = MessageStore::new();
        let stamp = store.append(Turn::model_text("real"));
        assert!(!store.retract_transient(stamp));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_truncate_before() {
        let mut store = MessageStore::new();
        for i in 0..5 {
            store.append(Turn::user(vec![Part::text(format!("turn {}", i))]));
        }
        let removed = store.truncate_before(2).unwrap();
        assert_eq!(removed.text_content(), "turn 2");
        assert_eq!(store.len(), 2);
        assert!(store.truncate_before(2).is_none());
    }
}
