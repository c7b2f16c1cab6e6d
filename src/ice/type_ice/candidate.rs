use crate::ice::{ice_error::IceError, type_ice::candidate_type::CandidateType};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::str::FromStr;
use std::sync::Arc;

/// Preference type by candidate type (according to WebRTC conventions)
const HOST_TYPE_PREF: u32 = 126;
const PEER_REFLEXIVE_TYPE_PREF: u32 = 110;
const SERVER_REFLEXIVE_TYPE_PREF: u32 = 100;
const RELAYED_TYPE_PREF: u32 = 0;

/// Offsets used in the priority calculation -> RFC 8445 §5.1.2.1
const TYPE_PREF_SHIFT: u32 = 24;
const LOCAL_PREF_SHIFT: u32 = 8;
const COMPONENT_OFFSET: u32 = 256;

pub const DEFAULT_COMPONENT_ID: u8 = 1;
pub const TRANSPORT_UDP: &str = "udp";

/// Represents a network address that a peer can offer to connect.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier that groups similar candidates
    pub foundation: String,
    /// Always 1: a single data component.
    pub component: u8,
    /// UDP in this case.
    pub transport: String,
    pub priority: u32,
    /// IP + port.
    pub address: SocketAddr,
    pub cand_type: CandidateType,
    /// Bound socket for local candidates; `None` for remote ones.
    pub socket: Option<Arc<UdpSocket>>,
}

impl Candidate {
    /// Local host candidate with a computed foundation and priority.
    #[must_use]
    pub fn host(address: SocketAddr, local_pref: u16, socket: Option<Arc<UdpSocket>>) -> Self {
        let cand_type = CandidateType::Host;
        Self {
            foundation: Self::calculate_foundation(cand_type, TRANSPORT_UDP, &address.ip()),
            component: DEFAULT_COMPONENT_ID,
            transport: TRANSPORT_UDP.to_owned(),
            priority: Self::calculate_priority(cand_type, local_pref, DEFAULT_COMPONENT_ID),
            address,
            cand_type,
            socket,
        }
    }

    /// Priority a peer-reflexive candidate learned from a check would get (RFC 8445 §7.2.5.3.1).
    #[must_use]
    pub const fn peer_reflexive_priority() -> u32 {
        Self::calculate_priority(CandidateType::PeerReflexive, u16::MAX, DEFAULT_COMPONENT_ID)
    }

    #[must_use]
    /// Creates a shallow copy of a Candidate without cloning the underlying socket.
    pub fn clone_light(&self) -> Candidate {
        Candidate {
            foundation: self.foundation.clone(),
            component: self.component,
            transport: self.transport.clone(),
            priority: self.priority,
            address: self.address,
            cand_type: self.cand_type,
            socket: None,
        }
    }

    // RFC 8445 §5.1.1.3: foundation, any stable identifier
    fn calculate_foundation(cand_type: CandidateType, transport_lc: &str, base_ip: &IpAddr) -> String {
        let mut hasher = DefaultHasher::new();
        format!("{cand_type}-{transport_lc}-{base_ip}").hash(&mut hasher);
        format!("{:x}", hasher.finish() & 0xffff_ffff)
    }

    // RFC 8445 §5.1.2.1: 32-bit candidate priority
    const fn calculate_priority(cand_type: CandidateType, local_pref: u16, component_id: u8) -> u32 {
        let type_pref = match cand_type {
            CandidateType::Host => HOST_TYPE_PREF,
            CandidateType::ServerReflexive => SERVER_REFLEXIVE_TYPE_PREF,
            CandidateType::PeerReflexive => PEER_REFLEXIVE_TYPE_PREF,
            CandidateType::Relayed => RELAYED_TYPE_PREF,
        };

        (type_pref << TYPE_PREF_SHIFT)
            | ((local_pref as u32) << LOCAL_PREF_SHIFT)
            | (COMPONENT_OFFSET - component_id as u32)
    }
}

impl fmt::Display for Candidate {
    /// Value of an `a=candidate:` line:
    /// `<foundation> <component> <transport> <priority> <ip> <port> typ <type>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.transport,
            self.priority,
            self.address.ip(),
            self.address.port(),
            self.cand_type
        )
    }
}

impl FromStr for Candidate {
    type Err = IceError;

    /// Parses the value of an `a=candidate:` line into a remote (socket-less) candidate.
    /// Extension attributes after the type (`raddr`, `generation`, ...) are ignored.
    fn from_str(s: &str) -> Result<Self, IceError> {
        let invalid = || IceError::InvalidCandidate(s.to_owned());
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [foundation, component, transport, priority, ip, port, typ, cand_type, ..] =
            parts.as_slice()
        else {
            return Err(invalid());
        };
        if *typ != "typ" {
            return Err(invalid());
        }
        let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
        let port: u16 = port.parse().map_err(|_| invalid())?;
        Ok(Self {
            foundation: (*foundation).to_owned(),
            component: component.parse().map_err(|_| invalid())?,
            transport: transport.to_ascii_lowercase(),
            priority: priority.parse().map_err(|_| invalid())?,
            address: SocketAddr::new(ip, port),
            cand_type: cand_type.parse().map_err(|_| invalid())?,
            socket: None,
        })
    }
}
