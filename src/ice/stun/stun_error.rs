use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StunError {
    #[error("datagram shorter than a STUN header ({0} bytes)")]
    TooShort(usize),
    #[error("not a STUN message")]
    NotStun,
    #[error("unsupported STUN message type {0:#06x}")]
    UnsupportedType(u16),
    #[error("attribute or body runs past the end of the datagram")]
    Truncated,
    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),
    #[error("message too long to encode")]
    TooLong,
    #[error("invalid integrity key")]
    Key,
    #[error("encode error: {0}")]
    Io(#[from] io::Error),
}
