use std::fmt;
use std::str::FromStr;

/// Closed set of envelope kinds understood by this version of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    StateUpdate,
    ShootEvent,
    SyncSnapshot,
    RoomJoin,
    RoomReady,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        Self::StateUpdate,
        Self::ShootEvent,
        Self::SyncSnapshot,
        Self::RoomJoin,
        Self::RoomReady,
    ];

    /// Wire name, shared with the browser build of the game.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StateUpdate => "player_update",
            Self::ShootEvent => "player_shoot",
            Self::SyncSnapshot => "game_sync",
            Self::RoomJoin => "room_join",
            Self::RoomReady => "room_ready",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    /// The unrecognised name, so callers can log it.
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_owned())
    }
}
