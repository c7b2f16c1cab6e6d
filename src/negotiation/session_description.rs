use crate::ice::{Candidate, IceCredentials};
use crate::negotiation::negotiation_error::NegotiationError;
use crate::sdp::{Attribute, Media, Origin, Sdp, SdpError};
use crate::transport::SCTP_PORT;
use sha2::{Digest, Sha256};
use std::fmt;

const SESSION_NAME: &str = "duelrtc";
const DIGEST_ALGORITHM: &str = "sha-256";

const ATTR_UFRAG: &str = "ice-ufrag";
const ATTR_PWD: &str = "ice-pwd";
const ATTR_SETUP: &str = "setup";
const ATTR_SCTP_PORT: &str = "sctp-port";
const ATTR_CANDIDATE: &str = "candidate";
const ATTR_END_OF_CANDIDATES: &str = "end-of-candidates";
const ATTR_OFFER_DIGEST: &str = "x-offer-digest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Offer,
    Answer,
}

impl DescriptionKind {
    fn setup(self) -> &'static str {
        match self {
            DescriptionKind::Offer => "actpass",
            DescriptionKind::Answer => "active",
        }
    }
}

impl fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionKind::Offer => write!(f, "offer"),
            DescriptionKind::Answer => write!(f, "answer"),
        }
    }
}

/// A negotiation artifact: everything the peer needs to reach us.
///
/// On the wire it is an SDP blob with one `m=application` section carrying
/// ICE credentials, every gathered candidate and the SCTP port. Answers also
/// carry the digest of the offer they answer, so an answer can only be
/// consumed by the host that produced that offer.
#[derive(Debug, Clone)]
pub struct SessionDescription {
    pub kind: DescriptionKind,
    pub session_id: u64,
    pub credentials: IceCredentials,
    pub candidates: Vec<Candidate>,
    pub sctp_port: u16,
    /// Hex SHA-256 of the answered offer; `None` on offers.
    pub offer_digest: Option<String>,
}

impl SessionDescription {
    pub fn offer(
        session_id: u64,
        credentials: IceCredentials,
        candidates: &[Candidate],
    ) -> Self {
        Self {
            kind: DescriptionKind::Offer,
            session_id,
            credentials,
            candidates: candidates.iter().map(Candidate::clone_light).collect(),
            sctp_port: SCTP_PORT,
            offer_digest: None,
        }
    }

    pub fn answer(
        offer: &SessionDescription,
        session_id: u64,
        credentials: IceCredentials,
        candidates: &[Candidate],
    ) -> Self {
        Self {
            kind: DescriptionKind::Answer,
            offer_digest: Some(offer.digest()),
            ..Self::offer(session_id, credentials, candidates)
        }
    }

    /// Identity of this description for answer binding.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}:{}:{}",
                self.session_id, self.credentials.ufrag, self.credentials.pwd
            )
            .as_bytes(),
        );
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Serializes to the SDP text that is relayed to the peer.
    pub fn encode(&self) -> String {
        let mut media = Media::application(self.sctp_port);
        media.push_attr(Attribute::new(ATTR_UFRAG, self.credentials.ufrag.as_str()));
        media.push_attr(Attribute::new(ATTR_PWD, self.credentials.pwd.as_str()));
        media.push_attr(Attribute::new(ATTR_SETUP, self.kind.setup()));
        media.push_attr(Attribute::new(ATTR_SCTP_PORT, self.sctp_port.to_string()));
        for candidate in &self.candidates {
            media.push_attr(Attribute::new(ATTR_CANDIDATE, candidate.to_string()));
        }
        media.push_attr(Attribute::flag(ATTR_END_OF_CANDIDATES));
        if let Some(digest) = &self.offer_digest {
            media.push_attr(Attribute::new(
                ATTR_OFFER_DIGEST,
                format!("{DIGEST_ALGORITHM} {digest}"),
            ));
        }

        let mut sdp = Sdp::new(Origin::for_session(self.session_id), SESSION_NAME);
        sdp.media.push(media);
        sdp.to_string_crlf()
    }

    /// Parses a relayed artifact. Only complete descriptions are accepted:
    /// credentials, at least one candidate and `a=end-of-candidates`.
    pub fn parse(input: &str) -> Result<Self, NegotiationError> {
        let sdp = Sdp::parse(input)?;
        let media = sdp
            .application()
            .ok_or(NegotiationError::Incomplete("m=application"))?;

        let ufrag = media
            .attr(ATTR_UFRAG)
            .ok_or(NegotiationError::Incomplete("a=ice-ufrag"))?;
        let pwd = media
            .attr(ATTR_PWD)
            .ok_or(NegotiationError::Incomplete("a=ice-pwd"))?;
        let kind = match media.attr(ATTR_SETUP) {
            Some("actpass") => DescriptionKind::Offer,
            Some("active") => DescriptionKind::Answer,
            Some(_) => return Err(SdpError::Invalid("a=setup").into()),
            None => return Err(NegotiationError::Incomplete("a=setup")),
        };
        let sctp_port = match media.attr(ATTR_SCTP_PORT) {
            Some(p) => p.parse::<u16>().map_err(SdpError::from)?,
            None => media.port,
        };
        if sctp_port != SCTP_PORT {
            return Err(SdpError::Invalid("a=sctp-port").into());
        }

        let candidates = media
            .attr_values(ATTR_CANDIDATE)
            .map(str::parse::<Candidate>)
            .collect::<Result<Vec<_>, _>>()?;
        if candidates.is_empty() {
            return Err(NegotiationError::Incomplete("a=candidate"));
        }
        if !media.has_attr(ATTR_END_OF_CANDIDATES) {
            return Err(NegotiationError::Incomplete("a=end-of-candidates"));
        }

        let offer_digest = match (kind, media.attr(ATTR_OFFER_DIGEST)) {
            (DescriptionKind::Offer, _) => None,
            (DescriptionKind::Answer, None) => {
                return Err(NegotiationError::Incomplete("a=x-offer-digest"));
            }
            (DescriptionKind::Answer, Some(value)) => match value.split_once(' ') {
                Some((DIGEST_ALGORITHM, hex)) => Some(hex.trim().to_ascii_lowercase()),
                _ => return Err(SdpError::Invalid("a=x-offer-digest").into()),
            },
        };

        Ok(Self {
            kind,
            session_id: sdp.origin.session_id(),
            credentials: IceCredentials::new(ufrag, pwd),
            candidates,
            sctp_port,
            offer_digest,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::net::SocketAddr;

    fn candidate(addr: &str) -> Candidate {
        Candidate::host(addr.parse::<SocketAddr>().unwrap(), u16::MAX, None)
    }

    fn offer() -> SessionDescription {
        SessionDescription::offer(
            42,
            IceCredentials::new("abcd1234", "0123456789abcdefghijklmn"),
            &[candidate("127.0.0.1:40000"), candidate("192.168.1.7:40001")],
        )
    }

    #[test]
    fn offer_text_has_expected_lines() {
        let text = offer().encode();
        assert!(text.starts_with("v=0\r\n"));
        assert!(text.contains("a=ice-ufrag:abcd1234\r\n"));
        assert!(text.contains("a=setup:actpass\r\n"));
        assert!(text.contains("a=sctp-port:5000\r\n"));
        assert!(text.contains("a=end-of-candidates\r\n"));
        assert!(!text.contains("x-offer-digest"));
        assert_eq!(text.matches("a=candidate:").count(), 2);
    }

    #[test]
    fn parses_what_it_encodes() {
        let parsed = SessionDescription::parse(&offer().encode()).unwrap();
        assert_eq!(parsed.kind, DescriptionKind::Offer);
        assert_eq!(parsed.session_id, 42);
        assert_eq!(parsed.credentials, offer().credentials);
        assert_eq!(parsed.sctp_port, 5000);
        let addrs: Vec<SocketAddr> = parsed.candidates.iter().map(|c| c.address).collect();
        assert_eq!(
            addrs,
            vec![
                "127.0.0.1:40000".parse::<SocketAddr>().unwrap(),
                "192.168.1.7:40001".parse().unwrap()
            ]
        );
    }

    #[test]
    fn answer_carries_offer_digest() {
        let o = offer();
        let a = SessionDescription::answer(
            &o,
            7,
            IceCredentials::generate(),
            &[candidate("127.0.0.1:40002")],
        );
        let parsed = SessionDescription::parse(&a.encode()).unwrap();
        assert_eq!(parsed.kind, DescriptionKind::Answer);
        assert_eq!(parsed.offer_digest.as_deref(), Some(o.digest().as_str()));
        assert_eq!(o.digest().len(), 64);
    }

    #[test]
    fn tolerates_copy_paste_damage() {
        let text = offer().encode().replace("\r\n", "\n");
        let damaged = format!("\n\n   {}   \n", text.replace('\n', "  \n"));
        let parsed = SessionDescription::parse(&damaged).unwrap();
        assert_eq!(parsed.candidates.len(), 2);
    }

    #[test]
    fn rejects_incomplete_descriptions() {
        let text = offer().encode();
        let no_end = text.replace("a=end-of-candidates\r\n", "");
        assert!(matches!(
            SessionDescription::parse(&no_end),
            Err(NegotiationError::Incomplete("a=end-of-candidates"))
        ));
        let no_pwd: String = text
            .lines()
            .filter(|l| !l.starts_with("a=ice-pwd"))
            .map(|l| format!("{l}\n"))
            .collect();
        assert!(matches!(
            SessionDescription::parse(&no_pwd),
            Err(NegotiationError::Incomplete("a=ice-pwd"))
        ));
        assert!(matches!(
            SessionDescription::parse("hello there"),
            Err(NegotiationError::MalformedArtifact(_))
        ));
    }

    #[test]
    fn rejects_foreign_sctp_port() {
        let text = offer().encode().replace("a=sctp-port:5000", "a=sctp-port:5001");
        assert!(matches!(
            SessionDescription::parse(&text),
            Err(NegotiationError::MalformedArtifact(_))
        ));
    }

    #[test]
    fn answer_without_digest_is_incomplete() {
        let text = offer().encode().replace("a=setup:actpass", "a=setup:active");
        assert!(matches!(
            SessionDescription::parse(&text),
            Err(NegotiationError::Incomplete("a=x-offer-digest"))
        ));
    }
}
