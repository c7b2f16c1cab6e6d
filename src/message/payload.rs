use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::message_kind::MessageKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Snapshot of one player, sent as `player_update`.
///
/// Every field is optional on the wire; absent fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerState {
    pub position: Vec3,
    pub rotation: Vec3,
    pub health: i32,
    pub score: u32,
    pub ammo: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShootEvent {
    pub position: Vec3,
    pub direction: Vec3,
    pub bullet_id: String,
}

/// Body of `room_join` and `room_ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: String,
}

/// Kind-specific data carried by an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    StateUpdate(PlayerState),
    Shoot(ShootEvent),
    /// Owned by the collaborator; carried as-is.
    SyncSnapshot(Value),
    RoomJoin(RoomInfo),
    RoomReady(RoomInfo),
}

impl Payload {
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::StateUpdate(_) => MessageKind::StateUpdate,
            Self::Shoot(_) => MessageKind::ShootEvent,
            Self::SyncSnapshot(_) => MessageKind::SyncSnapshot,
            Self::RoomJoin(_) => MessageKind::RoomJoin,
            Self::RoomReady(_) => MessageKind::RoomReady,
        }
    }
}
