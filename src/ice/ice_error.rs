use std::io;

use thiserror::Error;

use crate::ice::stun::StunError;

#[derive(Debug, Error)]
pub enum IceError {
    #[error("no usable local candidates (lan: {lan}, loopback: {loopback})")]
    NoCandidates { lan: bool, loopback: bool },
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("gathering has not completed")]
    NotGathered,
    #[error("remote description already applied")]
    RemoteAlreadySet,
    #[error("remote description has no usable candidates")]
    NoRemoteCandidates,
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),
    #[error("gathering worker stopped unexpectedly")]
    GatheringAborted,
    #[error("stun: {0}")]
    Stun(#[from] StunError),
}
