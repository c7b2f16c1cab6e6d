use thiserror::Error;

use crate::message::message_kind::MessageKind;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("not a valid envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageKind,
        source: serde_json::Error,
    },
    #[error("envelope is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}
