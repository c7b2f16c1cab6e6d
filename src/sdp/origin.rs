use std::fmt;
use std::str::FromStr;

use crate::sdp::{addr_type::AddrType, sdp_error::SdpError};

/// The `o=` line of a description.
///
/// `session_id` identifies one negotiation attempt; answers echo nothing of
/// it directly but bind to it through the offer digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    username: String,
    session_id: u64,
    session_version: u64,
    net_type: String,
    addr_type: AddrType,
    unicast_address: String,
}

impl Origin {
    pub fn new(
        username: impl Into<String>,
        session_id: u64,
        session_version: u64,
        net_type: impl Into<String>,
        addr_type: AddrType,
        unicast_address: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            session_id,
            session_version,
            net_type: net_type.into(),
            addr_type,
            unicast_address: unicast_address.into(),
        }
    }

    /// `- <id> 1 IN IP4 127.0.0.1`
    pub fn for_session(session_id: u64) -> Self {
        Self::new("-", session_id, 1, "IN", AddrType::IP4, "127.0.0.1")
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn session_version(&self) -> u64 {
        self.session_version
    }

    pub fn net_type(&self) -> &str {
        &self.net_type
    }

    pub fn addr_type(&self) -> AddrType {
        self.addr_type
    }

    pub fn unicast_address(&self) -> &str {
        &self.unicast_address
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            self.net_type,
            self.addr_type,
            self.unicast_address
        )
    }
}

impl FromStr for Origin {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, SdpError> {
        let parts: Vec<_> = s.split_whitespace().collect();
        let [username, id, version, net_type, addr_type, address] = parts.as_slice() else {
            return Err(SdpError::Invalid("o="));
        };
        Ok(Self::new(
            *username,
            id.parse::<u64>()?,
            version.parse::<u64>()?,
            *net_type,
            addr_type.parse()?,
            *address,
        ))
    }
}
