//! Clock and countdown facility for Sketchturn rooms.
//!
//! Two pieces:
//!
//! - [`TickScheduler`]: a fixed-period ticker on tokio time (one second by
//!   default) that a room actor awaits inside its `tokio::select!` loop.
//! - [`Countdown`]: a pure integer countdown the room decrements once per
//!   tick. Game logic reads `remaining()` from it, never from a timer.
//!
//! Keeping the two apart means turn logic can be driven tick by tick in
//! tests without any clock at all.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, guess, ... */ }
//!         info = scheduler.wait_for_tick() => {
//!             for _ in 0..=info.ticks_skipped { session.tick(); }
//!         }
//!     }
//! }
//! ```

mod countdown;
mod scheduler;

pub use countdown::Countdown;
pub use scheduler::{TickConfig, TickInfo, TickScheduler};
