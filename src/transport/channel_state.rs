#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Path selected, SCTP handshake in progress.
    Connecting,
    Open,
    /// Terminal. No reconnection.
    Closed,
}
