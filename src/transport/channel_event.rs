use crate::message::Envelope;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Open,
    Message(Envelope),
    Close,
}
