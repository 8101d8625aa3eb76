//! Wire protocol for framehub.
//!
//! This crate defines what clients and the relay say to each other:
//!
//! - **Types** ([`Envelope`] and its payloads): every message kind, as
//!   one tagged union.
//! - **Codecs** ([`Codec`], [`ProtobufCodec`], [`JsonCodec`]): how an
//!   envelope becomes bytes and back.
//! - **Errors**: [`ProtocolError`] for undecodable bytes, [`LobbyError`]
//!   for refused lobby commands reported inside replies.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session → Lobby / Game actor
//! ```

mod codec;
mod error;
mod types;
#[cfg(feature = "protobuf")]
mod wire;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
#[cfg(feature = "protobuf")]
pub use codec::ProtobufCodec;
pub use error::{LobbyError, ProtocolError};
pub use types::{
    CreateRoom, EnterRoom, Envelope, ExitRoom, Frame, FrameNumber, GameEnd,
    GameEndNotice, GameLoadComplete, GameLoadCompleteReply, Heartbeat, Input,
    LoadedPlayer, Operation, PlayerFrames, PlayerId, RoomId, RoomInfo,
    StartGame, SyncFrames,
};
