use std::fmt;
use std::str::FromStr;

use crate::sdp::{addr_type::AddrType, sdp_error::SdpError};

/// The `c=` line: `<nettype> <addrtype> <connection-address>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    net_type: String,
    addr_type: AddrType,
    connection_address: String,
}

impl Connection {
    pub fn new(
        net_type: impl Into<String>,
        addr_type: AddrType,
        connection_address: impl Into<String>,
    ) -> Self {
        Self {
            net_type: net_type.into(),
            addr_type,
            connection_address: connection_address.into(),
        }
    }

    /// `IN IP4 0.0.0.0`, the placeholder used when candidates carry the real addresses.
    pub fn unspecified() -> Self {
        Self::new("IN", AddrType::IP4, "0.0.0.0")
    }

    pub fn net_type(&self) -> &str {
        &self.net_type
    }

    pub fn addr_type(&self) -> AddrType {
        self.addr_type
    }

    pub fn connection_address(&self) -> &str {
        &self.connection_address
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.net_type, self.addr_type, self.connection_address
        )
    }
}

impl FromStr for Connection {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self, SdpError> {
        let parts: Vec<_> = s.split_whitespace().collect();
        let [net_type, addr_type, address] = parts.as_slice() else {
            return Err(SdpError::Invalid("c="));
        };
        Ok(Self::new(*net_type, addr_type.parse()?, *address))
    }
}
