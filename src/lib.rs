//! duelrtc: a two-peer session layer for real-time games.
//!
//! A host creates a room and produces an offer; the guest consumes it and
//! produces an answer; both are relayed out of band (copy/paste). Once the
//! host consumes the answer, ICE connectivity checks pick a UDP path and an
//! SCTP association on that path carries game envelopes in order.
//!
//! Start with [`session::Session`].

/// INI-style configuration loading.
pub mod config;
/// Candidate gathering, STUN and connectivity checks.
pub mod ice;
/// Logging sinks, the file logger and the `sink_*!` macros.
pub mod log;
/// Game envelopes and their JSON wire form.
pub mod message;
/// Offer/answer state machine and engine.
pub mod negotiation;
/// SDP text model used for negotiation artifacts.
pub mod sdp;
/// The public session façade.
pub mod session;
/// Single-subscriber notification hooks.
pub mod subscription;
/// The ordered, reliable data channel.
pub mod transport;
/// Clock helpers.
pub mod utils;
