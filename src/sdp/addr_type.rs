use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::sdp::sdp_error::SdpError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddrType {
    IP4,
    IP6,
}

impl AddrType {
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::IP4,
            IpAddr::V6(_) => Self::IP6,
        }
    }
}

impl fmt::Display for AddrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IP4 => "IP4",
            Self::IP6 => "IP6",
        })
    }
}

impl FromStr for AddrType {
    type Err = SdpError;
    fn from_str(s: &str) -> Result<Self, SdpError> {
        match s {
            "IP4" => Ok(Self::IP4),
            "IP6" => Ok(Self::IP6),
            _ => Err(SdpError::AddrType),
        }
    }
}
