pub mod stun_error;
pub mod stun_message;

pub use stun_error::StunError;
pub use stun_message::{StunClass, StunMessage, TransactionId, is_stun};
