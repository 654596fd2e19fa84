//! Who has already guessed this turn.

use std::collections::HashSet;

use sketchturn_protocol::ParticipantId;

/// Participants who guessed correctly in the current turn.
///
/// Cleared at the start of every turn. The session never records the
/// drawer, so `len()` is at most the number of guessers.
#[derive(Debug, Clone, Default)]
pub struct GuessTracker {
    guessed: HashSet<ParticipantId>,
}

impl GuessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a correct guess. Returns `false` if it was already counted.
    pub fn record(&mut self, participant: ParticipantId) -> bool {
        self.guessed.insert(participant)
    }

    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.guessed.contains(&participant)
    }

    pub fn remove(&mut self, participant: ParticipantId) -> bool {
        self.guessed.remove(&participant)
    }

    pub fn len(&self) -> usize {
        self.guessed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guessed.is_empty()
    }

    pub fn clear(&mut self) {
        self.guessed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut tracker = GuessTracker::new();
        assert!(tracker.record(ParticipantId(2)));
        assert!(!tracker.record(ParticipantId(2)));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.contains(ParticipantId(2)));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut tracker = GuessTracker::new();
        tracker.record(ParticipantId(2));
        tracker.record(ParticipantId(3));
        assert!(tracker.remove(ParticipantId(2)));
        assert!(!tracker.remove(ParticipantId(2)));
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
