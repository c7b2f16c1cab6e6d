//! The data channel: one ordered, reliable SCTP stream carried over the
//! UDP path selected by ICE.
pub mod channel_config;
pub mod channel_error;
pub mod channel_event;
pub mod channel_state;
pub mod close_handle;
pub mod data_channel;
pub mod sctp_role;

pub use channel_config::{ChannelConfig, SCTP_PORT};
pub use channel_error::ChannelError;
pub use channel_event::ChannelEvent;
pub use channel_state::ChannelState;
pub use close_handle::CloseHandle;
pub use data_channel::DataChannel;
pub use sctp_role::SctpRole;
