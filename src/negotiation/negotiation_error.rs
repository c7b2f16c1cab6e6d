use crate::ice::IceError;
use crate::negotiation::{
    negotiation_state::{NegotiationEvent, NegotiationState},
    role::Role,
    session_description::DescriptionKind,
};
use crate::sdp::SdpError;
use crate::transport::ChannelError;
use thiserror::Error;

/// Errors returned synchronously by the negotiation entry points.
///
/// None of them changes the connection state.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{event:?} is not valid in state {state:?}")]
    InvalidTransition {
        state: NegotiationState,
        event: NegotiationEvent,
    },
    #[error("{event:?} does not apply to the {role} side")]
    RoleMismatch { role: Role, event: NegotiationEvent },
    #[error("negotiation has failed; start again with a new session")]
    Terminal,
    #[error("malformed negotiation artifact: {0}")]
    MalformedArtifact(#[from] SdpError),
    #[error("expected an {expected} artifact, got an {found}")]
    UnexpectedArtifact {
        expected: DescriptionKind,
        found: DescriptionKind,
    },
    #[error("answer was produced for a different offer")]
    ForeignAnswer,
    #[error("negotiation artifact is missing {0}")]
    Incomplete(&'static str),
    #[error(transparent)]
    Ice(#[from] IceError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
