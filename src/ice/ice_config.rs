use std::time::Duration;

use crate::config::Config;

const SECTION: &str = "ICE";

/// Candidate gathering and connectivity-check settings (`[ICE]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceConfig {
    /// Gather a candidate on the primary LAN IPv4 interface.
    pub include_lan: bool,
    /// Gather a candidate on 127.0.0.1 (same-host sessions).
    pub include_loopback: bool,
    pub check_interval: Duration,
    /// No selected pair after this long counts as a transport failure.
    pub connect_timeout: Duration,
    /// Controlled side only: how long to wait for the first authenticated
    /// check from the controlling peer, which cannot start checking before
    /// the answer has been relayed to it. `connect_timeout` runs from there.
    pub answer_timeout: Duration,
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            include_lan: true,
            include_loopback: true,
            check_interval: Duration::from_millis(50),
            connect_timeout: Duration::from_millis(15_000),
            answer_timeout: Duration::from_millis(300_000),
        }
    }
}

impl IceConfig {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        Self {
            include_lan: cfg.get_bool(SECTION, "include_lan", d.include_lan),
            include_loopback: cfg.get_bool(SECTION, "include_loopback", d.include_loopback),
            check_interval: Duration::from_millis(cfg.get_parsed(
                SECTION,
                "check_interval_ms",
                millis(d.check_interval),
            )),
            connect_timeout: Duration::from_millis(cfg.get_parsed(
                SECTION,
                "connect_timeout_ms",
                millis(d.connect_timeout),
            )),
            answer_timeout: Duration::from_millis(cfg.get_parsed(
                SECTION,
                "answer_timeout_ms",
                millis(d.answer_timeout),
            )),
        }
    }

    /// Loopback-only profile for same-host sessions.
    pub fn loopback() -> Self {
        Self {
            include_lan: false,
            include_loopback: true,
            check_interval: Duration::from_millis(20),
            ..Self::default()
        }
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ice_section_with_defaults() {
        let cfg = Config::parse("[ICE]\ninclude_lan = off\nconnect_timeout_ms = 2500\n");
        let ice = IceConfig::from_config(&cfg);
        assert!(!ice.include_lan);
        assert!(ice.include_loopback);
        assert_eq!(ice.check_interval, Duration::from_millis(50));
        assert_eq!(ice.connect_timeout, Duration::from_millis(2500));
        assert_eq!(ice.answer_timeout, Duration::from_secs(300));
    }
}
