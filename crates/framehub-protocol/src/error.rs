//! Error types for the protocol layer.
//!
//! Two different kinds of failure live here:
//!
//! - [`ProtocolError`]: bytes could not be turned into an [`Envelope`]
//!   (or back). Raised by codecs.
//! - [`LobbyError`]: a lobby command was understood but refused. It is
//!   not a Rust-side failure of the relay; it travels to the client inside
//!   a reply envelope.
//!
//! [`Envelope`]: crate::Envelope

use serde::{Deserialize, Serialize};

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// JSON serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// JSON deserialization failed: malformed input, missing fields,
    /// wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Protobuf bytes were malformed or truncated.
    #[cfg(feature = "protobuf")]
    #[error("protobuf decode failed: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    /// The bytes were well-formed but carried no variant this build knows
    /// about (typically a newer client).
    #[error("unknown message variant")]
    UnknownVariant,

    /// The message decoded but violates protocol rules, e.g. a reply with
    /// neither a result nor an error.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Returns `true` if the session can keep reading after this error.
    ///
    /// An unknown variant is a per-message protocol error: the message is
    /// dropped and the stream stays in sync. Anything else means the
    /// stream can no longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownVariant)
    }
}

/// A lobby command that was refused, reported back to the requester.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error,
)]
pub enum LobbyError {
    #[error("room not found")]
    RoomNotFound,

    /// The player is already a member of some room.
    #[error("player already in a room")]
    AlreadyInRoom,

    #[error("room is already in game")]
    RoomAlreadyInGame,

    /// The player is already a member of the room it tried to enter.
    #[error("player already in this room")]
    PlayerAlreadyInRoom,

    #[error("player not found in room")]
    PlayerNotFound,

    #[error("failed to create room")]
    RoomCreationFailed,

    #[error("need at least {required} players to start, room has {present}")]
    NotEnoughPlayers { required: u32, present: u32 },
}

impl LobbyError {
    /// Stable numeric code used on the binary wire.
    pub fn code(&self) -> u32 {
        match self {
            Self::RoomNotFound => 1,
            Self::AlreadyInRoom => 2,
            Self::RoomAlreadyInGame => 3,
            Self::PlayerAlreadyInRoom => 4,
            Self::PlayerNotFound => 5,
            Self::RoomCreationFailed => 6,
            Self::NotEnoughPlayers { .. } => 7,
        }
    }

    /// Rebuilds an error from its wire code. `required` and `present` are
    /// only read for [`LobbyError::NotEnoughPlayers`].
    pub fn from_code(
        code: u32,
        required: u32,
        present: u32,
    ) -> Result<Self, ProtocolError> {
        Ok(match code {
            1 => Self::RoomNotFound,
            2 => Self::AlreadyInRoom,
            3 => Self::RoomAlreadyInGame,
            4 => Self::PlayerAlreadyInRoom,
            5 => Self::PlayerNotFound,
            6 => Self::RoomCreationFailed,
            7 => Self::NotEnoughPlayers { required, present },
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown lobby error code {other}"
                )));
            }
        })
    }
}
