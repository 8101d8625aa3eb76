//! Protobuf wire schema for [`Envelope`].
//!
//! Hand-written `prost` messages, no build script. The envelope is a single
//! `oneof`; field tags are part of the wire contract and must never be
//! reused. Unknown fields are skipped by `prost`, and an unknown `oneof`
//! tag decodes to an empty body, which surfaces as
//! [`ProtocolError::UnknownVariant`].

use prost::Message;

use crate::{
    CreateRoom, EnterRoom, Envelope, ExitRoom, Frame, GameEnd, GameEndNotice,
    GameLoadComplete, GameLoadCompleteReply, Heartbeat, Input, LoadedPlayer,
    LobbyError, PlayerFrames, ProtocolError, RoomId, RoomInfo, StartGame,
    SyncFrames,
};

#[derive(Clone, PartialEq, Message)]
pub(crate) struct EnvelopeProto {
    #[prost(
        oneof = "Body",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16"
    )]
    pub body: Option<Body>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub(crate) enum Body {
    #[prost(message, tag = "1")]
    EnterRoom(RoomPlayerProto),
    #[prost(message, tag = "2")]
    CreateRoom(PlayerProto),
    #[prost(message, tag = "3")]
    ExitRoom(RoomPlayerProto),
    #[prost(message, tag = "4")]
    StartGame(RoomProto),
    #[prost(message, tag = "5")]
    Heartbeat(PlayerProto),
    #[prost(message, tag = "6")]
    RoomInfoChanged(RoomInfoProto),
    #[prost(message, tag = "7")]
    EnterRoomReply(LobbyReplyProto),
    #[prost(message, tag = "8")]
    CreateRoomReply(LobbyReplyProto),
    #[prost(message, tag = "9")]
    ExitRoomReply(LobbyReplyProto),
    #[prost(message, tag = "10")]
    StartGameReply(LobbyReplyProto),
    #[prost(message, tag = "11")]
    GameLoadComplete(PlayerPayloadProto),
    #[prost(message, tag = "12")]
    GameLoadCompleteReply(GameLoadCompleteReplyProto),
    #[prost(message, tag = "13")]
    Input(InputProto),
    #[prost(message, tag = "14")]
    GameEnd(GameEndProto),
    #[prost(message, tag = "15")]
    GameEndNotice(GameEndProto),
    #[prost(message, tag = "16")]
    SyncFrames(SyncFramesProto),
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PlayerProto {
    #[prost(string, tag = "1")]
    pub player_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct RoomProto {
    #[prost(string, tag = "1")]
    pub room_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct RoomPlayerProto {
    #[prost(string, tag = "1")]
    pub room_id: String,
    #[prost(string, tag = "2")]
    pub player_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct RoomInfoProto {
    #[prost(string, tag = "1")]
    pub room_id: String,
    #[prost(string, repeated, tag = "2")]
    pub player_ids: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct LobbyErrorProto {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    /// Human-readable text, for clients that don't map codes.
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(uint32, tag = "3")]
    pub required: u32,
    #[prost(uint32, tag = "4")]
    pub present: u32,
}

/// Shared shape of the four lobby replies. Exactly one of `error`,
/// `info`, or a non-empty `room_id` is meaningful.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct LobbyReplyProto {
    #[prost(message, optional, tag = "1")]
    pub error: Option<LobbyErrorProto>,
    #[prost(message, optional, tag = "2")]
    pub info: Option<RoomInfoProto>,
    #[prost(string, tag = "3")]
    pub room_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PlayerPayloadProto {
    #[prost(string, tag = "1")]
    pub player_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct GameLoadCompleteReplyProto {
    #[prost(message, repeated, tag = "1")]
    pub players: Vec<PlayerPayloadProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct InputProto {
    #[prost(string, tag = "1")]
    pub player_id: String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub operations: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct GameEndProto {
    #[prost(string, tag = "1")]
    pub player_id: String,
    #[prost(bool, tag = "2")]
    pub force: bool,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct FrameProto {
    #[prost(uint32, tag = "1")]
    pub number: u32,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub operations: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PlayerFramesProto {
    #[prost(string, tag = "1")]
    pub player_id: String,
    #[prost(message, repeated, tag = "2")]
    pub frames: Vec<FrameProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct SyncFramesProto {
    #[prost(message, repeated, tag = "1")]
    pub players: Vec<PlayerFramesProto>,
}

// ---------------------------------------------------------------------------
// Envelope → proto
// ---------------------------------------------------------------------------

fn room_info_proto(info: &RoomInfo) -> RoomInfoProto {
    RoomInfoProto {
        room_id: info.room_id.0.clone(),
        player_ids: info.player_ids.iter().map(|p| p.0.clone()).collect(),
    }
}

fn error_proto(err: &LobbyError) -> LobbyErrorProto {
    let (required, present) = match err {
        LobbyError::NotEnoughPlayers { required, present } => {
            (*required, *present)
        }
        _ => (0, 0),
    };
    LobbyErrorProto {
        code: err.code(),
        message: err.to_string(),
        required,
        present,
    }
}

fn info_reply(result: &Result<RoomInfo, LobbyError>) -> LobbyReplyProto {
    match result {
        Ok(info) => LobbyReplyProto {
            info: Some(room_info_proto(info)),
            ..Default::default()
        },
        Err(e) => LobbyReplyProto {
            error: Some(error_proto(e)),
            ..Default::default()
        },
    }
}

fn room_reply(result: &Result<RoomId, LobbyError>) -> LobbyReplyProto {
    match result {
        Ok(room_id) => LobbyReplyProto {
            room_id: room_id.0.clone(),
            ..Default::default()
        },
        Err(e) => LobbyReplyProto {
            error: Some(error_proto(e)),
            ..Default::default()
        },
    }
}

fn game_end_proto(player_id: &str, force: bool, payload: &[u8]) -> GameEndProto {
    GameEndProto {
        player_id: player_id.to_owned(),
        force,
        payload: payload.to_vec(),
    }
}

impl From<&Envelope> for EnvelopeProto {
    fn from(envelope: &Envelope) -> Self {
        let body = match envelope {
            Envelope::EnterRoom(m) => Body::EnterRoom(RoomPlayerProto {
                room_id: m.room_id.0.clone(),
                player_id: m.player_id.0.clone(),
            }),
            Envelope::CreateRoom(m) => Body::CreateRoom(PlayerProto {
                player_id: m.player_id.0.clone(),
            }),
            Envelope::ExitRoom(m) => Body::ExitRoom(RoomPlayerProto {
                room_id: m.room_id.0.clone(),
                player_id: m.player_id.0.clone(),
            }),
            Envelope::StartGame(m) => Body::StartGame(RoomProto {
                room_id: m.room_id.0.clone(),
            }),
            Envelope::Heartbeat(m) => Body::Heartbeat(PlayerProto {
                player_id: m.player_id.0.clone(),
            }),
            Envelope::RoomInfoChanged(info) => {
                Body::RoomInfoChanged(room_info_proto(info))
            }
            Envelope::EnterRoomReply(r) => Body::EnterRoomReply(info_reply(r)),
            Envelope::CreateRoomReply(r) => {
                Body::CreateRoomReply(info_reply(r))
            }
            Envelope::ExitRoomReply(r) => Body::ExitRoomReply(room_reply(r)),
            Envelope::StartGameReply(r) => Body::StartGameReply(room_reply(r)),
            Envelope::GameLoadComplete(m) => {
                Body::GameLoadComplete(PlayerPayloadProto {
                    player_id: m.player_id.0.clone(),
                    payload: m.payload.clone(),
                })
            }
            Envelope::GameLoadCompleteReply(m) => {
                Body::GameLoadCompleteReply(GameLoadCompleteReplyProto {
                    players: m
                        .players
                        .iter()
                        .map(|p| PlayerPayloadProto {
                            player_id: p.player_id.0.clone(),
                            payload: p.payload.clone(),
                        })
                        .collect(),
                })
            }
            Envelope::Input(m) => Body::Input(InputProto {
                player_id: m.player_id.0.clone(),
                operations: m.operations.clone(),
            }),
            Envelope::GameEnd(m) => Body::GameEnd(game_end_proto(
                &m.player_id.0,
                m.force,
                &m.payload,
            )),
            Envelope::GameEndNotice(m) => Body::GameEndNotice(game_end_proto(
                &m.player_id.0,
                m.force,
                &m.payload,
            )),
            Envelope::SyncFrames(m) => Body::SyncFrames(SyncFramesProto {
                players: m
                    .players
                    .iter()
                    .map(|pf| PlayerFramesProto {
                        player_id: pf.player_id.0.clone(),
                        frames: pf
                            .frames
                            .iter()
                            .map(|f| FrameProto {
                                number: f.number,
                                operations: f.operations.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            }),
        };
        Self { body: Some(body) }
    }
}

// ---------------------------------------------------------------------------
// proto → Envelope
// ---------------------------------------------------------------------------

fn room_info(proto: RoomInfoProto) -> RoomInfo {
    RoomInfo {
        room_id: proto.room_id.into(),
        player_ids: proto.player_ids.into_iter().map(Into::into).collect(),
    }
}

fn lobby_error(proto: LobbyErrorProto) -> Result<LobbyError, ProtocolError> {
    LobbyError::from_code(proto.code, proto.required, proto.present)
}

fn info_result(
    reply: LobbyReplyProto,
) -> Result<Result<RoomInfo, LobbyError>, ProtocolError> {
    match (reply.error, reply.info) {
        (Some(err), _) => Ok(Err(lobby_error(err)?)),
        (None, Some(info)) => Ok(Ok(room_info(info))),
        (None, None) => Err(ProtocolError::InvalidMessage(
            "reply carries neither room info nor error".into(),
        )),
    }
}

fn room_result(
    reply: LobbyReplyProto,
) -> Result<Result<RoomId, LobbyError>, ProtocolError> {
    match reply.error {
        Some(err) => Ok(Err(lobby_error(err)?)),
        None if reply.room_id.is_empty() => Err(ProtocolError::InvalidMessage(
            "reply carries neither room id nor error".into(),
        )),
        None => Ok(Ok(reply.room_id.into())),
    }
}

impl TryFrom<EnvelopeProto> for Envelope {
    type Error = ProtocolError;

    fn try_from(proto: EnvelopeProto) -> Result<Self, Self::Error> {
        let body = proto.body.ok_or(ProtocolError::UnknownVariant)?;
        Ok(match body {
            Body::EnterRoom(m) => Envelope::EnterRoom(EnterRoom {
                room_id: m.room_id.into(),
                player_id: m.player_id.into(),
            }),
            Body::CreateRoom(m) => Envelope::CreateRoom(CreateRoom {
                player_id: m.player_id.into(),
            }),
            Body::ExitRoom(m) => Envelope::ExitRoom(ExitRoom {
                room_id: m.room_id.into(),
                player_id: m.player_id.into(),
            }),
            Body::StartGame(m) => Envelope::StartGame(StartGame {
                room_id: m.room_id.into(),
            }),
            Body::Heartbeat(m) => Envelope::Heartbeat(Heartbeat {
                player_id: m.player_id.into(),
            }),
            Body::RoomInfoChanged(info) => {
                Envelope::RoomInfoChanged(room_info(info))
            }
            Body::EnterRoomReply(r) => Envelope::EnterRoomReply(info_result(r)?),
            Body::CreateRoomReply(r) => {
                Envelope::CreateRoomReply(info_result(r)?)
            }
            Body::ExitRoomReply(r) => Envelope::ExitRoomReply(room_result(r)?),
            Body::StartGameReply(r) => {
                Envelope::StartGameReply(room_result(r)?)
            }
            Body::GameLoadComplete(m) => {
                Envelope::GameLoadComplete(GameLoadComplete {
                    player_id: m.player_id.into(),
                    payload: m.payload,
                })
            }
            Body::GameLoadCompleteReply(m) => {
                Envelope::GameLoadCompleteReply(GameLoadCompleteReply {
                    players: m
                        .players
                        .into_iter()
                        .map(|p| LoadedPlayer {
                            player_id: p.player_id.into(),
                            payload: p.payload,
                        })
                        .collect(),
                })
            }
            Body::Input(m) => Envelope::Input(Input {
                player_id: m.player_id.into(),
                operations: m.operations,
            }),
            Body::GameEnd(m) => Envelope::GameEnd(GameEnd {
                player_id: m.player_id.into(),
                force: m.force,
                payload: m.payload,
            }),
            Body::GameEndNotice(m) => Envelope::GameEndNotice(GameEndNotice {
                player_id: m.player_id.into(),
                force: m.force,
                payload: m.payload,
            }),
            Body::SyncFrames(m) => Envelope::SyncFrames(SyncFrames {
                players: m
                    .players
                    .into_iter()
                    .map(|pf| PlayerFrames {
                        player_id: pf.player_id.into(),
                        frames: pf
                            .frames
                            .into_iter()
                            .map(|f| Frame {
                                number: f.number,
                                operations: f.operations,
                            })
                            .collect(),
                    })
                    .collect(),
            }),
        })
    }
}
