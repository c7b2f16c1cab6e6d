pub mod codec;
pub mod envelope;
pub mod message_error;
pub mod message_kind;
pub mod payload;

pub use codec::{Decoded, decode, encode};
pub use envelope::Envelope;
pub use message_error::MessageError;
pub use message_kind::MessageKind;
pub use payload::{Payload, PlayerState, RoomInfo, ShootEvent, Vec3};
