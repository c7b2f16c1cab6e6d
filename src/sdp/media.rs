use std::fmt;
use std::str::FromStr;

use crate::sdp::{attribute::Attribute, connection::Connection, sdp_error::SdpError};

/// One `m=` section with the `c=` and `a=` lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: String,                   // m=<media>
    pub port: u16,                      // m=<media> <port>
    pub proto: String,                  // e.g. "UDP/DTLS/SCTP"
    pub fmts: Vec<String>,              // e.g. "webrtc-datachannel"
    pub connection: Option<Connection>, // c= at media
    pub attrs: Vec<Attribute>,          // a=*
}

impl Media {
    /// `m=application <port> UDP/DTLS/SCTP webrtc-datachannel`
    pub fn application(port: u16) -> Self {
        Self {
            kind: "application".to_owned(),
            port,
            proto: "UDP/DTLS/SCTP".to_owned(),
            fmts: vec!["webrtc-datachannel".to_owned()],
            connection: Some(Connection::unspecified()),
            attrs: Vec::new(),
        }
    }

    pub fn push_attr(&mut self, attr: Attribute) {
        self.attrs.push(attr);
    }

    /// Value of the first attribute named `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.key() == key)
            .and_then(Attribute::value)
    }

    /// Values of every attribute named `key`, in order.
    pub fn attr_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attrs
            .iter()
            .filter(move |a| a.key() == key)
            .filter_map(Attribute::value)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.iter().any(|a| a.key() == key)
    }
}

impl fmt::Display for Media {
    /// Only the `m=` value; `c=`/`a=` lines are written by the owning description.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.port, self.proto)?;
        for fmt_tok in &self.fmts {
            write!(f, " {fmt_tok}")?;
        }
        Ok(())
    }
}

impl FromStr for Media {
    type Err = SdpError;

    /// Parses `<media> <port>[/<num>] <proto> <fmt>...`.
    fn from_str(s: &str) -> Result<Self, SdpError> {
        let mut p = s.split_whitespace();
        let Some(kind) = p.next() else {
            return Err(SdpError::Invalid("m="));
        };
        let Some(port_tok) = p.next() else {
            return Err(SdpError::Invalid("m= port"));
        };
        let port = match port_tok.split_once('/') {
            Some((base, _)) => base.parse::<u16>()?,
            None => port_tok.parse::<u16>()?,
        };
        let Some(proto) = p.next() else {
            return Err(SdpError::Invalid("m= proto"));
        };
        Ok(Self {
            kind: kind.to_owned(),
            port,
            proto: proto.to_owned(),
            fmts: p.map(str::to_owned).collect(),
            connection: None,
            attrs: Vec::new(),
        })
    }
}
