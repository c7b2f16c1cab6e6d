//! JSON wire form: `{"kind": "...", "data": {...}, "timestamp": <ms>}`.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::message::{
    envelope::Envelope, message_error::MessageError, message_kind::MessageKind,
    payload::Payload,
};

#[derive(Serialize)]
struct WireOut<'a> {
    kind: &'a str,
    data: Value,
    timestamp: u64,
}

#[derive(Deserialize)]
struct WireIn {
    // browser peers still send the older `type` key
    #[serde(alias = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    timestamp: u64,
}

/// Outcome of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Envelope(Envelope),
    /// Well-formed frame with a kind this build does not know. Receivers ignore it.
    UnknownKind(String),
}

pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, MessageError> {
    let data = match envelope.payload() {
        Payload::StateUpdate(s) => serde_json::to_value(s)?,
        Payload::Shoot(s) => serde_json::to_value(s)?,
        Payload::SyncSnapshot(v) => v.clone(),
        Payload::RoomJoin(r) | Payload::RoomReady(r) => serde_json::to_value(r)?,
    };
    let wire = WireOut {
        kind: envelope.kind().as_str(),
        data,
        timestamp: envelope.sent_at(),
    };
    Ok(serde_json::to_vec(&wire)?)
}

pub fn decode(bytes: &[u8]) -> Result<Decoded, MessageError> {
    let text = std::str::from_utf8(bytes)?;
    let wire: WireIn = serde_json::from_str(text)?;

    let kind = match wire.kind.parse::<MessageKind>() {
        Ok(kind) => kind,
        Err(unknown) => return Ok(Decoded::UnknownKind(unknown)),
    };

    let payload = match kind {
        MessageKind::StateUpdate => Payload::StateUpdate(typed(kind, wire.data)?),
        MessageKind::ShootEvent => Payload::Shoot(typed(kind, wire.data)?),
        MessageKind::SyncSnapshot => Payload::SyncSnapshot(wire.data),
        MessageKind::RoomJoin => Payload::RoomJoin(typed(kind, wire.data)?),
        MessageKind::RoomReady => Payload::RoomReady(typed(kind, wire.data)?),
    };
    Ok(Decoded::Envelope(Envelope::new(payload, wire.timestamp)))
}

fn typed<T: DeserializeOwned>(kind: MessageKind, data: Value) -> Result<T, MessageError> {
    // absent data means "all defaults"
    let data = if data.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|source| MessageError::InvalidPayload { kind, source })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::message::payload::{PlayerState, RoomInfo, ShootEvent, Vec3};
    use serde_json::json;

    fn round_trip(envelope: Envelope) {
        let bytes = encode(&envelope).unwrap();
        assert_eq!(decode(&bytes).unwrap(), Decoded::Envelope(envelope));
    }

    #[test]
    fn every_kind_survives_the_wire() {
        round_trip(Envelope::new(
            Payload::StateUpdate(PlayerState {
                position: Vec3::new(1.5, 0.0, -3.25),
                rotation: Vec3::new(0.0, 0.5, 0.0),
                health: 80,
                score: 3,
                ammo: 12,
            }),
            1_700_000_000_000,
        ));
        round_trip(Envelope::new(
            Payload::Shoot(ShootEvent {
                position: Vec3::new(1.0, 2.0, 3.0),
                direction: Vec3::new(0.0, 0.0, -1.0),
                bullet_id: "b-17".into(),
            }),
            1,
        ));
        round_trip(Envelope::new(
            Payload::SyncSnapshot(json!({"players": [{"id": "a"}], "tick": 9})),
            2,
        ));
        round_trip(Envelope::new(
            Payload::RoomJoin(RoomInfo {
                room_id: "K7Q2ZD".into(),
            }),
            3,
        ));
        round_trip(Envelope::new(
            Payload::RoomReady(RoomInfo {
                room_id: "K7Q2ZD".into(),
            }),
            4,
        ));
    }

    #[test]
    fn wire_uses_kind_names_and_camel_case_keys() {
        let env = Envelope::new(
            Payload::Shoot(ShootEvent {
                bullet_id: "x".into(),
                ..ShootEvent::default()
            }),
            42,
        );
        let v: Value = serde_json::from_slice(&encode(&env).unwrap()).unwrap();
        assert_eq!(v["kind"], "player_shoot");
        assert_eq!(v["timestamp"], 42);
        assert_eq!(v["data"]["bulletId"], "x");
    }

    #[test]
    fn partial_state_update_takes_defaults() {
        let frame = br#"{"kind":"player_update","data":{"health":80},"timestamp":5}"#;
        let Decoded::Envelope(env) = decode(frame).unwrap() else {
            panic!("expected an envelope");
        };
        let Payload::StateUpdate(state) = env.payload() else {
            panic!("expected a state update");
        };
        assert_eq!(state.health, 80);
        assert_eq!(state.ammo, 0);
        assert_eq!(state.position, Vec3::default());
        assert_eq!(env.sent_at(), 5);
    }

    #[test]
    fn missing_data_is_all_defaults() {
        let frame = br#"{"kind":"room_ready","timestamp":5}"#;
        let decoded = decode(frame).unwrap();
        assert_eq!(
            decoded,
            Decoded::Envelope(Envelope::new(Payload::RoomReady(RoomInfo::default()), 5))
        );
    }

    #[test]
    fn accepts_type_key_from_browser_peers() {
        let frame = br#"{"type":"player_shoot","data":{"bulletId":"b-1"},"timestamp":9}"#;
        let Decoded::Envelope(env) = decode(frame).unwrap() else {
            panic!("expected an envelope");
        };
        assert_eq!(env.kind(), MessageKind::ShootEvent);
        assert_eq!(env.sent_at(), 9);
    }

    #[test]
    fn unknown_kind_is_reported_not_failed() {
        let frame = br#"{"kind":"emote","data":{"id":3},"timestamp":5}"#;
        assert_eq!(decode(frame).unwrap(), Decoded::UnknownKind("emote".into()));
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(decode(b"not json"), Err(MessageError::Json(_))));
        assert!(matches!(decode(&[0xff, 0xfe]), Err(MessageError::Utf8(_))));
        assert!(matches!(
            decode(br#"{"kind":"player_update","data":{}}"#),
            Err(MessageError::Json(_))
        ));
        assert!(matches!(
            decode(br#"{"kind":"player_update","data":{"health":"full"},"timestamp":1}"#),
            Err(MessageError::InvalidPayload {
                kind: MessageKind::StateUpdate,
                ..
            })
        ));
    }
}
