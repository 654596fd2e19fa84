//! Whole-second countdowns.

/// A countdown measured in whole ticks.
///
/// Starts at `total` and moves toward zero by one per [`tick`](Self::tick),
/// never below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub fn new(total: u32) -> Self {
        Self { remaining: total }
    }

    /// Consumes one tick and returns what is left.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
