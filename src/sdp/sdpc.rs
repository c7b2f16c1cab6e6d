use std::fmt;

use crate::sdp::{
    attribute::Attribute, connection::Connection, media::Media, origin::Origin,
    sdp_error::SdpError,
};

/// A session description reduced to the lines this crate produces and reads.
///
/// Unknown line types (`i=`, `u=`, `b=`, ...) are skipped on parse so that a
/// description produced by a slightly different peer still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdp {
    pub version: u8,                    // v= (always 0)
    pub origin: Origin,                 // o=
    pub session_name: String,           // s=
    pub connection: Option<Connection>, // c= (optional at session)
    pub timing: (u64, u64),             // t=
    pub attrs: Vec<Attribute>,          // a=* (session-level)
    pub media: Vec<Media>,              // m= sections
}

impl Sdp {
    pub fn new(origin: Origin, session_name: impl Into<String>) -> Self {
        Self {
            version: 0,
            origin,
            session_name: session_name.into(),
            connection: None,
            timing: (0, 0),
            attrs: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Parses a description.
    ///
    /// Lines may end in `\n` or `\r\n`; leading/trailing whitespace on each
    /// line and around the whole blob is ignored (copy/paste damage).
    pub fn parse(input: &str) -> Result<Self, SdpError> {
        let mut version: Option<u8> = None;
        let mut origin: Option<Origin> = None;
        let mut session_name: Option<String> = None;
        let mut connection: Option<Connection> = None;
        let mut timing: Option<(u64, u64)> = None;
        let mut sattrs: Vec<Attribute> = Vec::new();
        let mut media: Vec<Media> = Vec::new();

        for raw in input.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let Some((prefix, rest)) = line.split_once('=') else {
                return Err(SdpError::Invalid("line without '='"));
            };
            // session-level until the first m=
            let current = media.last_mut();
            match prefix.trim() {
                "v" => version = Some(rest.trim().parse::<u8>()?),
                "o" => origin = Some(rest.parse()?),
                "s" => session_name = Some(rest.trim().to_owned()),
                "c" => {
                    let c: Connection = rest.parse()?;
                    match current {
                        Some(m) => m.connection = Some(c),
                        None => connection = Some(c),
                    }
                }
                "t" => {
                    let mut p = rest.split_whitespace();
                    let (Some(start), Some(stop)) = (p.next(), p.next()) else {
                        return Err(SdpError::Invalid("t="));
                    };
                    timing = Some((start.parse()?, stop.parse()?));
                }
                "m" => media.push(rest.parse()?),
                "a" => {
                    let attr = Attribute::parse(rest);
                    match current {
                        Some(m) => m.push_attr(attr),
                        None => sattrs.push(attr),
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            version: version.ok_or(SdpError::Missing("v="))?,
            origin: origin.ok_or(SdpError::Missing("o="))?,
            session_name: session_name.ok_or(SdpError::Missing("s="))?,
            connection,
            timing: timing.unwrap_or((0, 0)),
            attrs: sattrs,
            media,
        })
    }

    pub fn to_string_crlf(&self) -> String {
        let mut out = String::new();
        macro_rules! pushln {
            ($($arg:tt)*) => {{
                out.push_str(&format!($($arg)*));
                out.push_str("\r\n");
            }};
        }

        pushln!("v={}", self.version);
        pushln!("o={}", self.origin);
        pushln!("s={}", self.session_name);
        if let Some(c) = &self.connection {
            pushln!("c={c}");
        }
        pushln!("t={} {}", self.timing.0, self.timing.1);
        for a in &self.attrs {
            pushln!("a={a}");
        }
        for m in &self.media {
            pushln!("m={m}");
            if let Some(c) = &m.connection {
                pushln!("c={c}");
            }
            for a in &m.attrs {
                pushln!("a={a}");
            }
        }
        out
    }

    /// The first `m=application` section.
    pub fn application(&self) -> Option<&Media> {
        self.media.iter().find(|m| m.kind == "application")
    }
}

impl fmt::Display for Sdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_crlf())
    }
}
