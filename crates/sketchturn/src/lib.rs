//! # Sketchturn
//!
//! Server for a real-time, multi-room drawing-and-guessing party game.
//!
//! Clients speak JSON over WebSocket. A connection's first message is a
//! `Join` naming a room; the room is created on first join and torn down
//! when its last participant leaves. Everything after that is routed to
//! the room's actor in [`sketchturn_room`], which runs the turn clock and
//! scoring and pushes [`ServerEvent`](sketchturn_protocol::ServerEvent)s
//! back to every participant.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchturn::prelude::*;
//!
//! # async fn run() -> Result<(), SketchError> {
//! let server = SketchServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod transport;

pub use config::{ConfigError, ServerConfig};
pub use error::SketchError;
pub use server::{SketchServer, SketchServerBuilder};
pub use transport::{TransportError, WebSocketListener};

/// The types most servers and tests need.
pub mod prelude {
    pub use crate::{ConfigError, ServerConfig, SketchError, SketchServer, SketchServerBuilder};
    pub use sketchturn_protocol::{
        ClientMessage, Notice, Participant, ParticipantId, RoomId, RoomView, ScoreEntry, ServerEvent,
        Stroke,
    };
    pub use sketchturn_room::{GameConfig, RoomError};
}
