use std::time::Duration;

use crate::config::Config;
use crate::ice::ice_config::millis;

const SECTION: &str = "Channel";

/// SCTP port on both ends. sctp-proto always speaks 5000, so it is advertised
/// as-is and a peer announcing any other port is refused.
pub const SCTP_PORT: u16 = 5000;

/// Transport channel settings (`[Channel]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub handshake_timeout: Duration,
    pub keepalive_interval: Duration,
    /// Silence from the peer for this long closes the channel.
    pub idle_timeout: Duration,
    /// Larger encoded envelopes are dropped, inbound and outbound.
    pub max_message_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(10_000),
            keepalive_interval: Duration::from_millis(1_000),
            idle_timeout: Duration::from_millis(10_000),
            max_message_size: 65_535,
        }
    }
}

impl ChannelConfig {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        let ms = |key: &str, default: Duration| {
            Duration::from_millis(cfg.get_parsed(SECTION, key, millis(default)))
        };
        Self {
            handshake_timeout: ms("handshake_timeout_ms", d.handshake_timeout),
            keepalive_interval: ms("keepalive_interval_ms", d.keepalive_interval),
            idle_timeout: ms("idle_timeout_ms", d.idle_timeout),
            max_message_size: cfg.get_parsed(SECTION, "max_message_size", d.max_message_size),
        }
    }

    /// Same-host profile: quicker keepalives so a vanished peer is noticed fast.
    pub fn loopback() -> Self {
        Self {
            keepalive_interval: Duration::from_millis(200),
            idle_timeout: Duration::from_millis(2_000),
            ..Self::default()
        }
    }
}
