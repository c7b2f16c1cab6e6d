//! STUN Binding messages (RFC 5389) with the attributes ICE connectivity
//! checks need: USERNAME, USE-CANDIDATE, XOR-MAPPED-ADDRESS and
//! MESSAGE-INTEGRITY (HMAC-SHA1, short-term credentials).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha1::Sha1;

use crate::ice::stun::stun_error::StunError;

type HmacSha1 = Hmac<Sha1>;

pub const MAGIC_COOKIE: u32 = 0x2112_A442;
pub const HEADER_LEN: usize = 20;

const BINDING_REQUEST: u16 = 0x0001;
const BINDING_SUCCESS: u16 = 0x0101;

const ATTR_USERNAME: u16 = 0x0006;
const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
const ATTR_USE_CANDIDATE: u16 = 0x0025;

const INTEGRITY_LEN: usize = 20;
const INTEGRITY_ATTR_LEN: usize = 4 + INTEGRITY_LEN;

const FAMILY_V4: u8 = 0x01;
const FAMILY_V6: u8 = 0x02;

pub type TransactionId = [u8; 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunClass {
    Request,
    SuccessResponse,
}

impl StunClass {
    const fn message_type(self) -> u16 {
        match self {
            Self::Request => BINDING_REQUEST,
            Self::SuccessResponse => BINDING_SUCCESS,
        }
    }

    const fn from_message_type(t: u16) -> Option<Self> {
        match t {
            BINDING_REQUEST => Some(Self::Request),
            BINDING_SUCCESS => Some(Self::SuccessResponse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Integrity {
    /// Offset of the MESSAGE-INTEGRITY attribute header within `raw`.
    offset: usize,
    tag: [u8; INTEGRITY_LEN],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunMessage {
    pub class: StunClass,
    pub transaction_id: TransactionId,
    pub username: Option<String>,
    pub use_candidate: bool,
    pub mapped_address: Option<SocketAddr>,
    integrity: Option<Integrity>,
    raw: Vec<u8>,
}

/// Cheap demultiplexing test: first byte < 4 and the magic cookie in place.
pub fn is_stun(buf: &[u8]) -> bool {
    buf.len() >= HEADER_LEN && buf[0] < 4 && BigEndian::read_u32(&buf[4..8]) == MAGIC_COOKIE
}

impl StunMessage {
    /// Binding request with a fresh random transaction id.
    pub fn binding_request(username: impl Into<String>, use_candidate: bool) -> Self {
        let mut transaction_id = [0u8; 12];
        OsRng.fill_bytes(&mut transaction_id);
        Self {
            class: StunClass::Request,
            transaction_id,
            username: Some(username.into()),
            use_candidate,
            mapped_address: None,
            integrity: None,
            raw: Vec::new(),
        }
    }

    /// Success response to `transaction_id`, reporting where the request came from.
    pub fn success_response(transaction_id: TransactionId, mapped_address: SocketAddr) -> Self {
        Self {
            class: StunClass::SuccessResponse,
            transaction_id,
            username: None,
            use_candidate: false,
            mapped_address: Some(mapped_address),
            integrity: None,
            raw: Vec::new(),
        }
    }

    /// Serializes the message and signs it with `key` (the responder's ICE password).
    pub fn encode(&self, key: &str) -> Result<Vec<u8>, StunError> {
        let mut buf = Vec::with_capacity(96);
        buf.write_u16::<BigEndian>(self.class.message_type())?;
        buf.write_u16::<BigEndian>(0)?;
        buf.write_u32::<BigEndian>(MAGIC_COOKIE)?;
        buf.extend_from_slice(&self.transaction_id);

        if let Some(username) = &self.username {
            write_attr(&mut buf, ATTR_USERNAME, username.as_bytes())?;
        }
        if self.use_candidate {
            write_attr(&mut buf, ATTR_USE_CANDIDATE, &[])?;
        }
        if let Some(addr) = self.mapped_address {
            let value = xor_address(addr, &self.transaction_id)?;
            write_attr(&mut buf, ATTR_XOR_MAPPED_ADDRESS, &value)?;
        }

        // the signed header already counts the integrity attribute
        let signed_len = buf.len() - HEADER_LEN + INTEGRITY_ATTR_LEN;
        set_length(&mut buf, signed_len)?;
        let tag = sign(key, &buf)?;
        write_attr(&mut buf, ATTR_MESSAGE_INTEGRITY, &tag)?;
        let total_len = buf.len() - HEADER_LEN;
        set_length(&mut buf, total_len)?;
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, StunError> {
        if buf.len() < HEADER_LEN {
            return Err(StunError::TooShort(buf.len()));
        }
        if !is_stun(buf) {
            return Err(StunError::NotStun);
        }
        let msg_type = BigEndian::read_u16(&buf[0..2]);
        let length = usize::from(BigEndian::read_u16(&buf[2..4]));
        let end = HEADER_LEN + length;
        if end > buf.len() || length % 4 != 0 {
            return Err(StunError::Truncated);
        }
        let class =
            StunClass::from_message_type(msg_type).ok_or(StunError::UnsupportedType(msg_type))?;
        let mut transaction_id = [0u8; 12];
        transaction_id.copy_from_slice(&buf[8..HEADER_LEN]);

        let mut username = None;
        let mut use_candidate = false;
        let mut mapped_address = None;
        let mut integrity = None;

        let mut pos = HEADER_LEN;
        while pos + 4 <= end {
            let attr_type = BigEndian::read_u16(&buf[pos..pos + 2]);
            let attr_len = usize::from(BigEndian::read_u16(&buf[pos + 2..pos + 4]));
            let value_end = pos + 4 + attr_len;
            if value_end > end {
                return Err(StunError::Truncated);
            }
            let value = &buf[pos + 4..value_end];
            match attr_type {
                ATTR_USERNAME => {
                    let name = std::str::from_utf8(value)
                        .map_err(|_| StunError::MalformedAttribute("USERNAME"))?;
                    username = Some(name.to_owned());
                }
                ATTR_USE_CANDIDATE => use_candidate = true,
                ATTR_XOR_MAPPED_ADDRESS => {
                    mapped_address = Some(unxor_address(value, &transaction_id)?);
                }
                ATTR_MESSAGE_INTEGRITY => {
                    if attr_len != INTEGRITY_LEN {
                        return Err(StunError::MalformedAttribute("MESSAGE-INTEGRITY"));
                    }
                    let mut tag = [0u8; INTEGRITY_LEN];
                    tag.copy_from_slice(value);
                    integrity = Some(Integrity { offset: pos, tag });
                    // only FINGERPRINT may follow; nothing after is covered
                    break;
                }
                _ => {}
            }
            pos = value_end + padding(attr_len);
        }

        Ok(Self {
            class,
            transaction_id,
            username,
            use_candidate,
            mapped_address,
            integrity,
            raw: buf[..end].to_vec(),
        })
    }

    /// True when the message carries MESSAGE-INTEGRITY computed with `key`.
    pub fn verify_integrity(&self, key: &str) -> bool {
        let Some(integrity) = &self.integrity else {
            return false;
        };
        let mut covered = self.raw[..integrity.offset].to_vec();
        if set_length(
            &mut covered,
            integrity.offset - HEADER_LEN + INTEGRITY_ATTR_LEN,
        )
        .is_err()
        {
            return false;
        }
        match HmacSha1::new_from_slice(key.as_bytes()) {
            Ok(mut mac) => {
                mac.update(&covered);
                mac.verify_slice(&integrity.tag).is_ok()
            }
            Err(_) => false,
        }
    }
}

fn sign(key: &str, data: &[u8]) -> Result<[u8; INTEGRITY_LEN], StunError> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| StunError::Key)?;
    mac.update(data);
    let full = mac.finalize().into_bytes();
    let mut tag = [0u8; INTEGRITY_LEN];
    tag.copy_from_slice(&full);
    Ok(tag)
}

const fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn write_attr(buf: &mut Vec<u8>, attr_type: u16, value: &[u8]) -> Result<(), StunError> {
    let len = u16::try_from(value.len()).map_err(|_| StunError::TooLong)?;
    buf.write_u16::<BigEndian>(attr_type)?;
    buf.write_u16::<BigEndian>(len)?;
    buf.extend_from_slice(value);
    buf.resize(buf.len() + padding(value.len()), 0);
    Ok(())
}

fn set_length(buf: &mut [u8], len: usize) -> Result<(), StunError> {
    let len = u16::try_from(len).map_err(|_| StunError::TooLong)?;
    BigEndian::write_u16(&mut buf[2..4], len);
    Ok(())
}

fn xor_key(transaction_id: &TransactionId) -> [u8; 16] {
    let mut key = [0u8; 16];
    BigEndian::write_u32(&mut key[..4], MAGIC_COOKIE);
    key[4..].copy_from_slice(transaction_id);
    key
}

fn xor_address(addr: SocketAddr, transaction_id: &TransactionId) -> Result<Vec<u8>, StunError> {
    let key = xor_key(transaction_id);
    let mut out = Vec::with_capacity(20);
    out.write_u8(0)?;
    out.write_u8(if addr.is_ipv4() { FAMILY_V4 } else { FAMILY_V6 })?;
    out.write_u16::<BigEndian>(addr.port() ^ BigEndian::read_u16(&key[..2]))?;
    let octets: Vec<u8> = match addr.ip() {
        IpAddr::V4(ip) => ip.octets().to_vec(),
        IpAddr::V6(ip) => ip.octets().to_vec(),
    };
    out.extend(octets.iter().zip(key.iter()).map(|(a, k)| a ^ k));
    Ok(out)
}

fn unxor_address(value: &[u8], transaction_id: &TransactionId) -> Result<SocketAddr, StunError> {
    const MALFORMED: StunError = StunError::MalformedAttribute("XOR-MAPPED-ADDRESS");
    if value.len() < 8 {
        return Err(MALFORMED);
    }
    let key = xor_key(transaction_id);
    let port = BigEndian::read_u16(&value[2..4]) ^ BigEndian::read_u16(&key[..2]);
    let mut octets = [0u8; 16];
    let addr_bytes = &value[4..];
    for (i, b) in addr_bytes.iter().take(16).enumerate() {
        octets[i] = b ^ key[i];
    }
    let ip = match (value[1], addr_bytes.len()) {
        (FAMILY_V4, 4) => IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
        (FAMILY_V6, 16) => IpAddr::V6(Ipv6Addr::from(octets)),
        _ => return Err(MALFORMED),
    };
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const PWD: &str = "aaaabbbbccccddddeeeeffff";

    #[test]
    fn request_carries_username_and_nomination() {
        let req = StunMessage::binding_request("remote:local", true);
        let bytes = req.encode(PWD).unwrap();
        assert!(is_stun(&bytes));
        assert_eq!(bytes.len() % 4, 0);

        let back = StunMessage::decode(&bytes).unwrap();
        assert_eq!(back.class, StunClass::Request);
        assert_eq!(back.transaction_id, req.transaction_id);
        assert_eq!(back.username.as_deref(), Some("remote:local"));
        assert!(back.use_candidate);
        assert!(back.verify_integrity(PWD));
    }

    #[test]
    fn header_length_covers_every_attribute() {
        let bytes = StunMessage::binding_request("remote:local", true)
            .encode(PWD)
            .unwrap();
        let declared = usize::from(BigEndian::read_u16(&bytes[2..4]));
        assert_eq!(declared, bytes.len() - HEADER_LEN);

        let resp = StunMessage::success_response([7u8; 12], "127.0.0.1:5000".parse().unwrap());
        let bytes = resp.encode(PWD).unwrap();
        assert_eq!(
            usize::from(BigEndian::read_u16(&bytes[2..4])),
            bytes.len() - HEADER_LEN
        );
        assert!(StunMessage::decode(&bytes).unwrap().verify_integrity(PWD));
    }

    #[test]
    fn wrong_password_fails_integrity() {
        let bytes = StunMessage::binding_request("a:b", false)
            .encode(PWD)
            .unwrap();
        let back = StunMessage::decode(&bytes).unwrap();
        assert!(!back.verify_integrity("some-other-password-000"));
    }

    #[test]
    fn tampered_body_fails_integrity() {
        let mut bytes = StunMessage::binding_request("abcd:efgh", false)
            .encode(PWD)
            .unwrap();
        // flip a byte inside the USERNAME value
        bytes[HEADER_LEN + 4] ^= 0x01;
        let back = StunMessage::decode(&bytes).unwrap();
        assert!(!back.verify_integrity(PWD));
    }

    #[test]
    fn response_reports_mapped_address() {
        let tx = [7u8; 12];
        for addr in ["192.168.1.20:54321", "[::1]:6000"] {
            let addr: SocketAddr = addr.parse().unwrap();
            let bytes = StunMessage::success_response(tx, addr).encode(PWD).unwrap();
            let back = StunMessage::decode(&bytes).unwrap();
            assert_eq!(back.class, StunClass::SuccessResponse);
            assert_eq!(back.transaction_id, tx);
            assert_eq!(back.mapped_address, Some(addr));
            assert!(back.verify_integrity(PWD));
        }
    }

    #[test]
    fn unsigned_message_never_verifies() {
        let mut bytes = Vec::new();
        bytes.write_u16::<BigEndian>(BINDING_REQUEST).unwrap();
        bytes.write_u16::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(MAGIC_COOKIE).unwrap();
        bytes.extend_from_slice(&[1u8; 12]);
        let msg = StunMessage::decode(&bytes).unwrap();
        assert!(!msg.verify_integrity(PWD));
    }

    #[test]
    fn rejects_non_stun_and_truncated_input() {
        assert!(matches!(
            StunMessage::decode(&[0u8; 4]),
            Err(StunError::TooShort(4))
        ));
        assert!(!is_stun(b"{\"kind\":\"player_update\",\"data\":{}}"));

        let mut bytes = StunMessage::binding_request("a:b", false)
            .encode(PWD)
            .unwrap();
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(
            StunMessage::decode(&bytes),
            Err(StunError::Truncated)
        ));
    }
}
