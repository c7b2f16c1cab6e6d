use crate::negotiation::NegotiationError;
use crate::session::room_id::RoomIdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("invalid room id: {0}")]
    RoomId(#[from] RoomIdError),
}
