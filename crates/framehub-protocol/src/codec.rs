//! Codec trait and implementations for turning envelopes into bytes.
//!
//! Sessions only ever move [`Envelope`]s, so the codec is a plain pair of
//! fallible functions rather than a generic serde adapter. The server picks
//! one codec for all connections at startup.
//!
//! - [`ProtobufCodec`] (feature `protobuf`): compact, field-tagged, and
//!   tolerant of fields and variants it doesn't know. The production
//!   default.
//! - [`JsonCodec`] (feature `json`): human-readable, handy when poking at
//!   the relay from a browser console.

use crate::{Envelope, ProtocolError};

/// Encodes envelopes to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every session task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes an envelope into one transport message.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the envelope can't be represented.
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one transport message.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownVariant`] for a well-formed message
    /// of a kind this build doesn't know, and another variant for bytes
    /// that can't be trusted at all.
    fn decode(&self, data: &[u8]) -> Result<Envelope, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use framehub_protocol::{Codec, CreateRoom, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::CreateRoom(CreateRoom { player_id: "A".into() });
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(envelope).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
        let known = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|kind| Envelope::KINDS.contains(&kind));
        if !known {
            return Err(ProtocolError::UnknownVariant);
        }
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// ProtobufCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses Protocol Buffers (via `prost`).
#[cfg(feature = "protobuf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

#[cfg(feature = "protobuf")]
impl Codec for ProtobufCodec {
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
        use prost::Message;
        Ok(crate::wire::EnvelopeProto::from(envelope).encode_to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        use prost::Message;
        let proto = crate::wire::EnvelopeProto::decode(data)?;
        Envelope::try_from(proto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Frame, GameLoadCompleteReply, Heartbeat, LoadedPlayer, LobbyError,
        PlayerFrames, RoomId, RoomInfo, SyncFrames,
    };

    fn sample_sync() -> Envelope {
        Envelope::SyncFrames(SyncFrames {
            players: vec![PlayerFrames {
                player_id: "A".into(),
                frames: vec![
                    Frame {
                        number: 5,
                        operations: vec![vec![1, 2], vec![3]],
                    },
                    Frame {
                        number: 6,
                        operations: vec![],
                    },
                ],
            }],
        })
    }

    #[test]
    fn test_json_unknown_type_is_recoverable() {
        let err = JsonCodec
            .decode(br#"{"type":"Spectate","data":{"player_id":"A"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownVariant));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_json_known_type_with_bad_body_is_fatal() {
        let err = JsonCodec
            .decode(br#"{"type":"Input","data":{"player_id":7}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_json_decode_garbage_is_fatal() {
        let err = JsonCodec.decode(b"not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_protobuf_keeps_empty_frames_and_operation_order() {
        let env = sample_sync();
        let bytes = ProtobufCodec.encode(&env).unwrap();
        assert_eq!(ProtobufCodec.decode(&bytes).unwrap(), env);
    }

    #[test]
    fn test_protobuf_reply_variants() {
        let ok = Envelope::CreateRoomReply(Ok(RoomInfo {
            room_id: RoomId::from("1"),
            player_ids: vec!["A".into()],
        }));
        let bytes = ProtobufCodec.encode(&ok).unwrap();
        assert_eq!(ProtobufCodec.decode(&bytes).unwrap(), ok);

        let err = Envelope::StartGameReply(Err(LobbyError::NotEnoughPlayers {
            required: 2,
            present: 1,
        }));
        let bytes = ProtobufCodec.encode(&err).unwrap();
        assert_eq!(ProtobufCodec.decode(&bytes).unwrap(), err);
    }

    #[test]
    fn test_protobuf_aggregate_load_reply() {
        let env = Envelope::GameLoadCompleteReply(GameLoadCompleteReply {
            players: vec![
                LoadedPlayer {
                    player_id: "A".into(),
                    payload: b"seed-a".to_vec(),
                },
                LoadedPlayer {
                    player_id: "B".into(),
                    payload: vec![],
                },
            ],
        });
        let bytes = ProtobufCodec.encode(&env).unwrap();
        assert_eq!(ProtobufCodec.decode(&bytes).unwrap(), env);
    }

    #[test]
    fn test_protobuf_empty_message_is_unknown_variant() {
        // An envelope whose oneof tag this build doesn't know decodes to an
        // empty body. Field 99, varint 1.
        let bytes = [0x98, 0x06, 0x01];
        let err = ProtobufCodec.decode(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownVariant));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_protobuf_truncated_bytes_are_fatal() {
        let env = Envelope::Heartbeat(Heartbeat {
            player_id: "player-with-a-long-id".into(),
        });
        let bytes = ProtobufCodec.encode(&env).unwrap();
        let err = ProtobufCodec.decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, ProtocolError::ProtobufDecode(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_reply_without_result_is_invalid() {
        // Tag 10 (StartGameReply), length-delimited, empty body.
        let bytes = [0x52, 0x00];
        let err = ProtobufCodec.decode(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }
}
