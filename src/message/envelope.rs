use crate::message::{message_kind::MessageKind, payload::Payload};

/// Unit of application traffic.
///
/// Immutable once built: there are getters but no setters, and the channel
/// hands received envelopes out by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    payload: Payload,
    sent_at: u64,
}

impl Envelope {
    /// `sent_at` is milliseconds since the Unix epoch at the sender.
    pub fn new(payload: Payload, sent_at: u64) -> Self {
        Self { payload, sent_at }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn sent_at(&self) -> u64 {
        self.sent_at
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}
