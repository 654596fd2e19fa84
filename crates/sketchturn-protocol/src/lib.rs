//! Wire vocabulary for Sketchturn.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identity** ([`ParticipantId`], [`RoomId`]) and the read-only views
//!   a room publishes ([`RoomView`], [`ScoreEntry`]).
//! - **Inbound** ([`ClientMessage`]): the actions a participant can take.
//! - **Outbound** ([`ServerEvent`], [`Notice`]): everything the room
//!   engine announces, paired with a [`Recipient`].
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   become bytes.
//!
//! The protocol layer knows nothing about rooms, timers, or scoring.
//!
//! ```text
//! Connection (bytes) → Protocol (ClientMessage) → Room engine → ServerEvent
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Notice, Participant, ParticipantId, Recipient, RoomId,
    RoomView, ScoreEntry, ServerEvent, Stroke,
};
