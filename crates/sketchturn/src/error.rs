//! Unified error type for the Sketchturn server.

use sketchturn_protocol::ProtocolError;
use sketchturn_room::RoomError;

use crate::ConfigError;
use crate::transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unexpected message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown room, full, wrong phase).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Startup configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
