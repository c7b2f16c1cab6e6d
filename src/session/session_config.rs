use crate::config::Config;
use crate::ice::IceConfig;
use crate::session::room_id::{DEFAULT_ROOM_ID_LEN, MAX_ROOM_ID_LEN};
use crate::transport::ChannelConfig;

/// Everything a [`Session`](super::Session) needs, usually read from a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub ice: IceConfig,
    pub channel: ChannelConfig,
    pub room_id_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice: IceConfig::default(),
            channel: ChannelConfig::default(),
            room_id_length: DEFAULT_ROOM_ID_LEN,
        }
    }
}

impl SessionConfig {
    /// Reads `[ICE]`, `[Channel]` and `[Room]`; missing keys keep their defaults.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            ice: IceConfig::from_config(cfg),
            channel: ChannelConfig::from_config(cfg),
            room_id_length: cfg
                .get_parsed("Room", "id_length", DEFAULT_ROOM_ID_LEN)
                .clamp(1, MAX_ROOM_ID_LEN),
        }
    }

    /// Both peers on this machine.
    pub fn loopback() -> Self {
        Self {
            ice: IceConfig::loopback(),
            channel: ChannelConfig::loopback(),
            room_id_length: DEFAULT_ROOM_ID_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reads_all_sections() {
        let cfg = Config::parse(
            "[ICE]\ninclude_lan = false\n[Channel]\nidle_timeout_ms = 3000\n[Room]\nid_length = 12\n",
        );
        let sc = SessionConfig::from_config(&cfg);
        assert!(!sc.ice.include_lan);
        assert_eq!(sc.channel.idle_timeout, Duration::from_millis(3000));
        assert_eq!(sc.room_id_length, MAX_ROOM_ID_LEN);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(
            SessionConfig::from_config(&Config::empty()),
            SessionConfig::default()
        );
    }
}
