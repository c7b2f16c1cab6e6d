/// Which side sends the SCTP INIT. The host is the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SctpRole {
    Client,
    Server,
}
