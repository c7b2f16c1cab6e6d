use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("could not start SCTP association: {0}")]
    Connect(String),
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}
