//! Game configuration and the turn phase state machine.

use serde::{Deserialize, Serialize};
use sketchturn_tick::Countdown;

use crate::RoomError;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Per-room game settings. All durations are whole seconds.
///
/// Every field has a default, so a partial TOML/JSON document or
/// `GameConfig { max_rounds: 5, ..Default::default() }` both work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Word-selection countdown.
    pub selection_secs: u32,
    /// Guessing countdown; also the `totalGuessTime` used for scoring.
    pub guessing_secs: u32,
    /// Remaining guessing time at which the hint is disclosed.
    pub hint_threshold_secs: u32,
    /// Letters uncovered by the hint.
    pub hint_letters: usize,
    /// Pause between "everyone guessed" and the next turn.
    pub full_clear_grace_secs: u32,
    pub max_rounds: u32,
    pub min_participants: usize,
    pub max_participants: usize,
    /// Clear the score board whenever a new game starts.
    pub reset_scores_on_start: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            selection_secs: 7,
            guessing_secs: 45,
            hint_threshold_secs: 20,
            hint_letters: 2,
            full_clear_grace_secs: 3,
            max_rounds: 3,
            min_participants: 2,
            max_participants: 8,
            reset_scores_on_start: false,
        }
    }
}

impl GameConfig {
    /// Rejects settings the turn scheduler cannot run with.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.selection_secs == 0 || self.guessing_secs == 0 {
            return Err(RoomError::InvalidConfig(
                "countdowns must be at least one second".into(),
            ));
        }
        if self.hint_threshold_secs >= self.guessing_secs {
            return Err(RoomError::InvalidConfig(format!(
                "hint threshold {}s must be below the guessing duration {}s",
                self.hint_threshold_secs, self.guessing_secs
            )));
        }
        if self.max_rounds == 0 {
            return Err(RoomError::InvalidConfig("max_rounds must be positive".into()));
        }
        if self.min_participants < 2 || self.min_participants > self.max_participants {
            return Err(RoomError::InvalidConfig(format!(
                "participant limits {}..={} are invalid (need 2 <= min <= max)",
                self.min_participants, self.max_participants
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a room is in its turn cycle.
///
/// ```text
/// Idle ─start→ Selecting ─0s / force→ Guessing ─0s→ (score) ─→ next turn
///                  ↑                      │
///                  │                everyone guessed
///                  │                      ↓
///                  └──── next turn ←── Settling ─grace→ (score)
/// ```
///
/// Each timed phase carries its own [`Countdown`], so a room can never run
/// a selection and a guessing countdown at once: entering a phase replaces
/// the previous one. Scoring, rotation and game end are instantaneous and
/// happen inside the transition out of `Guessing`/`Settling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game running.
    Idle,
    /// The drawer is choosing a word.
    Selecting(Countdown),
    /// Guesses are being accepted.
    Guessing(Countdown),
    /// Everyone guessed; waiting out the grace period before settling.
    Settling(Countdown),
}

impl Phase {
    /// The live countdown, if this phase has one.
    pub fn countdown(&self) -> Option<&Countdown> {
        match self {
            Self::Idle => None,
            Self::Selecting(c) | Self::Guessing(c) | Self::Settling(c) => Some(c),
        }
    }

    /// Returns `true` if the room needs one-second ticks in this phase.
    pub fn is_ticking(&self) -> bool {
        self.countdown().is_some()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Selecting(_) => write!(f, "Selecting"),
            Self::Guessing(_) => write!(f, "Guessing"),
            Self::Settling(_) => write!(f, "Settling"),
        }
    }
}
