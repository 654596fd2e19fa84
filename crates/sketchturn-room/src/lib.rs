//! Room sessions for Sketchturn.
//!
//! Every room is an independent game: one participant draws, the others
//! guess against a countdown, points accrue, and the drawer rotates through
//! the roster for a fixed number of rounds.
//!
//! # Key types
//!
//! - [`Session`]: the per-room turn state machine. Pure and synchronous:
//!   every input (an action or a one-second [`Session::tick`]) returns the
//!   events to broadcast.
//! - [`SessionRegistry`]: creates rooms on first join, routes actions,
//!   destroys rooms when the last participant leaves.
//! - [`RoomHandle`]: commands for a running room actor. Each room runs in
//!   its own Tokio task that owns its `Session` and its tick scheduler.
//! - [`scoring`]: the point formulas.
//! - [`GameConfig`]: durations, round count, roster limits.

mod config;
mod error;
mod hint;
mod manager;
mod room;
mod scoreboard;
pub mod scoring;
mod session;
mod tracker;

pub use config::{GameConfig, Phase};
pub use error::RoomError;
pub use hint::mask_word;
pub use manager::SessionRegistry;
pub use room::{ActionReply, Departure, ParticipantSender, RoomAction, RoomHandle};
pub use scoreboard::ScoreBoard;
pub use session::{GuessOutcome, Outbox, Session};
pub use tracker::GuessTracker;
