use crate::transport::{ChannelEvent, DataChannel};

/// Asynchronous outcomes reported by [`NegotiationEngine::poll`](super::NegotiationEngine::poll).
pub enum EngineNotice {
    /// Host: the offer is complete and must be relayed to the guest.
    OfferReady(String),
    /// Guest: the answer is complete and must be relayed to the host.
    AnswerReady(String),
    /// The channel opened. Ownership passes to the caller, together with the
    /// events it produced after `Open` in the same poll.
    ChannelOpen {
        channel: DataChannel,
        early_events: Vec<ChannelEvent>,
    },
    /// Gathering, checks or the handshake failed. The engine is now `Failed`.
    Failed(String),
}

impl std::fmt::Debug for EngineNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineNotice::OfferReady(_) => write!(f, "OfferReady"),
            EngineNotice::AnswerReady(_) => write!(f, "AnswerReady"),
            EngineNotice::ChannelOpen { early_events, .. } => {
                write!(f, "ChannelOpen({} early event(s))", early_events.len())
            }
            EngineNotice::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}
