//! Per-room running totals.

use std::collections::HashMap;

use sketchturn_protocol::{Participant, ParticipantId, ScoreEntry};

/// Accumulated points per participant.
///
/// Keyed by [`ParticipantId`], so two participants sharing a display name
/// keep separate totals. Entries are created on the first award and
/// survive the participant leaving; only [`clear`](Self::clear) lowers a
/// total.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    entries: HashMap<ParticipantId, ScoreEntry>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `points` to the participant's total and returns the new total.
    pub fn award(&mut self, participant: &Participant, points: u32) -> u32 {
        let entry = self
            .entries
            .entry(participant.id)
            .or_insert_with(|| ScoreEntry {
                participant_id: participant.id,
                name: participant.name.clone(),
                points: 0,
            });
        entry.points = entry.points.saturating_add(points);
        entry.points
    }

    pub fn points(&self, participant: ParticipantId) -> u32 {
        self.entries.get(&participant).map_or(0, |e| e.points)
    }

    /// Entries ordered by points, highest first; ties by id.
    pub fn snapshot(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(a.participant_id.cmp(&b.participant_id))
        });
        entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
