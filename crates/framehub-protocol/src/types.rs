//! Core protocol types: everything that travels between a client and the
//! relay.
//!
//! The unit of exchange is the [`Envelope`], a tagged union with exactly
//! one populated variant. Client→server commands, lobby replies, and the
//! in-game lockstep messages all live in the same enum so a session can
//! hand any decoded message to whichever actor currently owns it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::LobbyError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player identifier as declared by the client.
///
/// Player ids are opaque strings chosen by the game client. The relay only
/// compares them; it never parses them.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A room identifier, assigned by the lobby.
///
/// Also used as the id of the game spawned from the room.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A game frame number. Frame 0 is the first frame after loading.
pub type FrameNumber = u32;

/// One opaque input operation. The relay never looks inside.
pub type Operation = Vec<u8>;

// ---------------------------------------------------------------------------
// Lobby messages
// ---------------------------------------------------------------------------

/// A room and its current roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub player_ids: Vec<PlayerId>,
}

/// Client → Server: join an existing room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterRoom {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

/// Client → Server: create a room with the sender as its only member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoom {
    pub player_id: PlayerId,
}

/// Client → Server: leave a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRoom {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

/// Client → Server: start the game for every member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGame {
    pub room_id: RoomId,
}

/// Client → Server: keep-alive. Resets the session's read deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Game messages
// ---------------------------------------------------------------------------

/// Client → Server: this client finished loading.
///
/// `payload` is opaque per-client init data (seed, skin, ...). The relay
/// caches it and hands every player's payload to everyone once the whole
/// room is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLoadComplete {
    pub player_id: PlayerId,
    pub payload: Vec<u8>,
}

/// One player's cached load payload inside [`GameLoadCompleteReply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPlayer {
    pub player_id: PlayerId,
    pub payload: Vec<u8>,
}

/// Server → Client: every player is loaded; the game is starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLoadCompleteReply {
    pub players: Vec<LoadedPlayer>,
}

/// Client → Server: operations produced by one player since its last input.
///
/// The server stamps them with its own current frame on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub player_id: PlayerId,
    pub operations: Vec<Operation>,
}

/// Client → Server: the player's game is over.
///
/// With `force` set the whole game ends immediately; otherwise the game
/// ends once every player has sent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub player_id: PlayerId,
    pub force: bool,
    pub payload: Vec<u8>,
}

/// Server → Client: a player sent [`GameEnd`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndNotice {
    pub player_id: PlayerId,
    pub force: bool,
    pub payload: Vec<u8>,
}

/// The operations one player recorded for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub number: FrameNumber,
    pub operations: Vec<Operation>,
}

/// A contiguous run of frames for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFrames {
    pub player_id: PlayerId,
    pub frames: Vec<Frame>,
}

/// Server → Client: every player's frames for the range the receiver has
/// not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFrames {
    pub players: Vec<PlayerFrames>,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level message. Exactly one variant is populated.
///
/// `#[serde(tag = "type", content = "data")]` produces adjacently tagged
/// JSON: `{ "type": "CreateRoom", "data": { "player_id": "A" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Envelope {
    // -- Client → Server: lobby --
    EnterRoom(EnterRoom),
    CreateRoom(CreateRoom),
    ExitRoom(ExitRoom),
    StartGame(StartGame),
    Heartbeat(Heartbeat),

    // -- Server → Client: lobby --
    RoomInfoChanged(RoomInfo),
    EnterRoomReply(Result<RoomInfo, LobbyError>),
    CreateRoomReply(Result<RoomInfo, LobbyError>),
    ExitRoomReply(Result<RoomId, LobbyError>),
    StartGameReply(Result<RoomId, LobbyError>),

    // -- Game --
    GameLoadComplete(GameLoadComplete),
    GameLoadCompleteReply(GameLoadCompleteReply),
    Input(Input),
    GameEnd(GameEnd),
    GameEndNotice(GameEndNotice),
    SyncFrames(SyncFrames),
}

impl Envelope {
    /// Every variant name, as it appears in the JSON `type` tag.
    pub const KINDS: [&'static str; 16] = [
        "EnterRoom",
        "CreateRoom",
        "ExitRoom",
        "StartGame",
        "Heartbeat",
        "RoomInfoChanged",
        "EnterRoomReply",
        "CreateRoomReply",
        "ExitRoomReply",
        "StartGameReply",
        "GameLoadComplete",
        "GameLoadCompleteReply",
        "Input",
        "GameEnd",
        "GameEndNotice",
        "SyncFrames",
    ];

    /// The variant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EnterRoom(_) => "EnterRoom",
            Self::CreateRoom(_) => "CreateRoom",
            Self::ExitRoom(_) => "ExitRoom",
            Self::StartGame(_) => "StartGame",
            Self::Heartbeat(_) => "Heartbeat",
            Self::RoomInfoChanged(_) => "RoomInfoChanged",
            Self::EnterRoomReply(_) => "EnterRoomReply",
            Self::CreateRoomReply(_) => "CreateRoomReply",
            Self::ExitRoomReply(_) => "ExitRoomReply",
            Self::StartGameReply(_) => "StartGameReply",
            Self::GameLoadComplete(_) => "GameLoadComplete",
            Self::GameLoadCompleteReply(_) => "GameLoadCompleteReply",
            Self::Input(_) => "Input",
            Self::GameEnd(_) => "GameEnd",
            Self::GameEndNotice(_) => "GameEndNotice",
            Self::SyncFrames(_) => "SyncFrames",
        }
    }

    /// Returns `true` for variants a client is allowed to send.
    pub fn is_client_message(&self) -> bool {
        matches!(
            self,
            Self::EnterRoom(_)
                | Self::CreateRoom(_)
                | Self::ExitRoom(_)
                | Self::StartGame(_)
                | Self::Heartbeat(_)
                | Self::GameLoadComplete(_)
                | Self::Input(_)
                | Self::GameEnd(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_ids_display_raw_value() {
        assert_eq!(PlayerId::from("A").to_string(), "A");
        assert_eq!(RoomId::from("12").to_string(), "12");
    }

    #[test]
    fn test_envelope_is_adjacently_tagged() {
        let env = Envelope::CreateRoom(CreateRoom {
            player_id: "A".into(),
        });
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "CreateRoom");
        assert_eq!(json["data"]["player_id"], "A");
    }

    #[test]
    fn test_reply_carries_structured_error() {
        let env = Envelope::EnterRoomReply(Err(LobbyError::RoomNotFound));
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "EnterRoomReply");
        assert_eq!(json["data"]["Err"], "RoomNotFound");

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_unknown_json_fields_are_ignored() {
        let json = r#"{"type":"Heartbeat","data":{"player_id":"A","rtt":12}}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            env,
            Envelope::Heartbeat(Heartbeat {
                player_id: "A".into()
            })
        );
    }

    #[test]
    fn test_kind_and_direction() {
        let input = Envelope::Input(Input {
            player_id: "A".into(),
            operations: vec![vec![1]],
        });
        assert_eq!(input.kind(), "Input");
        assert!(input.is_client_message());

        let sync = Envelope::SyncFrames(SyncFrames { players: vec![] });
        assert_eq!(sync.kind(), "SyncFrames");
        assert!(!sync.is_client_message());
    }
}
