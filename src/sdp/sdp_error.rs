use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SdpError {
    #[error("missing field: {0}")]
    Missing(&'static str),
    #[error("invalid field: {0}")]
    Invalid(&'static str),
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("invalid address type")]
    AddrType,
}
