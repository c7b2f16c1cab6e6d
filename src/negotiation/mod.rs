//! Offer/answer negotiation: the connection record, its state machine and
//! the engine that turns two relayed artifacts into an open channel.
pub mod connection;
pub mod engine_notice;
pub mod negotiation_engine;
pub mod negotiation_error;
pub mod negotiation_state;
pub mod role;
pub mod session_description;

pub use connection::Connection;
pub use engine_notice::EngineNotice;
pub use negotiation_engine::NegotiationEngine;
pub use negotiation_error::NegotiationError;
pub use negotiation_state::{NegotiationEvent, NegotiationState, transition};
pub use role::Role;
pub use session_description::{DescriptionKind, SessionDescription};
