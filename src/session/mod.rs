//! Session Manager: the entry point used by the rest of the game.
pub mod room_id;
pub mod session_config;
pub mod session_error;
pub mod session_manager;

pub use room_id::{RoomId, RoomIdError};
pub use session_config::SessionConfig;
pub use session_error::SessionError;
pub use session_manager::Session;
