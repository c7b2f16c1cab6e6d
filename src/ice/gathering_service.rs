use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::ice::{ice_config::IceConfig, ice_error::IceError, type_ice::candidate::Candidate};
use crate::log::LogSink;
use crate::{sink_debug, sink_warn};

const DISCOVERY_TARGET_IP: &str = "8.8.8.8";
const DISCOVERY_TARGET_PORT: u16 = 80;
const UNSPECIFIED_V4: &str = "0.0.0.0:0";

/// LAN beats loopback when both peers could use either.
const LAN_LOCAL_PREF: u16 = u16::MAX;
const LOOPBACK_LOCAL_PREF: u16 = u16::MAX - 1;

/// Gathers host candidates: the primary LAN IPv4 interface and/or loopback.
///
/// Each candidate owns a non-blocking socket bound to an ephemeral port.
/// LAN discovery failures are logged and skipped; the call only fails when
/// nothing at all could be gathered.
pub fn gather_host_candidates(
    config: &IceConfig,
    log: &Arc<dyn LogSink>,
) -> Result<Vec<Candidate>, IceError> {
    let mut out = Vec::new();

    if config.include_lan {
        match discover_local_ipv4().and_then(|ip| bind_candidate(ip, LAN_LOCAL_PREF)) {
            Ok(c) => {
                sink_debug!(log, "[ICE] gathered LAN host candidate {}", c.address);
                out.push(c);
            }
            Err(e) => sink_warn!(log, "[ICE] no LAN candidate: {}", e),
        }
    }

    if config.include_loopback {
        match bind_candidate(IpAddr::V4(Ipv4Addr::LOCALHOST), LOOPBACK_LOCAL_PREF) {
            Ok(c) => {
                sink_debug!(log, "[ICE] gathered loopback host candidate {}", c.address);
                out.push(c);
            }
            Err(e) => sink_warn!(log, "[ICE] no loopback candidate: {}", e),
        }
    }

    if out.is_empty() {
        return Err(IceError::NoCandidates {
            lan: config.include_lan,
            loopback: config.include_loopback,
        });
    }
    Ok(out)
}

/// Discover the primary IPv4 local IP using a temporary socket.
/// Connecting a UDP socket sends nothing; it only selects a route.
fn discover_local_ipv4() -> Result<IpAddr, IceError> {
    let probe = UdpSocket::bind(UNSPECIFIED_V4)?;
    probe.connect((DISCOVERY_TARGET_IP, DISCOVERY_TARGET_PORT))?;
    let local_ip = probe.local_addr()?.ip();

    if local_ip.is_loopback() || !local_ip.is_ipv4() || local_ip.is_unspecified() {
        Err(IceError::InvalidCandidate(format!(
            "no routable IPv4 interface (got {local_ip})"
        )))
    } else {
        Ok(local_ip)
    }
}

fn bind_candidate(ip: IpAddr, local_pref: u16) -> Result<Candidate, IceError> {
    let sock = UdpSocket::bind(SocketAddr::new(ip, 0))?;
    sock.set_nonblocking(true)?;
    let addr = sock.local_addr()?;
    Ok(Candidate::host(addr, local_pref, Some(Arc::new(sock))))
}
