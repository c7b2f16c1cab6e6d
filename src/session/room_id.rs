use rand::{Rng, rngs::OsRng};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_ROOM_ID_LEN: usize = 6;
pub const MAX_ROOM_ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomIdError {
    #[error("room id is empty")]
    Empty,
    #[error("room id has {0} characters, at most {MAX_ROOM_ID_LEN} allowed")]
    TooLong(usize),
    #[error("room id contains {0:?}; only letters and digits are allowed")]
    InvalidChar(char),
}

/// Short human-relayed room label, stored uppercase.
///
/// Carries no security or uniqueness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Random id of `len` characters (clamped to `1..=8`).
    pub fn generate(len: usize) -> Self {
        let len = len.clamp(1, MAX_ROOM_ID_LEN);
        let id = (0..len)
            .map(|_| char::from(ALPHABET[OsRng.gen_range(0..ALPHABET.len())]))
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RoomIdError::Empty);
        }
        if let Some(bad) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(RoomIdError::InvalidChar(bad));
        }
        if s.len() > MAX_ROOM_ID_LEN {
            return Err(RoomIdError::TooLong(s.len()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_short_uppercase_alphanumerics() {
        for len in [0, 1, 6, 8, 20] {
            let id = RoomId::generate(len);
            assert!(!id.as_str().is_empty());
            assert!(id.as_str().len() <= MAX_ROOM_ID_LEN);
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
        assert_eq!(RoomId::generate(DEFAULT_ROOM_ID_LEN).as_str().len(), 6);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("ab12cd".parse::<RoomId>(), "AB12CD".parse::<RoomId>());
        assert_eq!(" x9y8 ".parse::<RoomId>().map(|r| r.to_string()), Ok("X9Y8".into()));
    }

    #[test]
    fn parsing_rejects_bad_ids() {
        assert_eq!("".parse::<RoomId>(), Err(RoomIdError::Empty));
        assert_eq!("ABCDEFGHI".parse::<RoomId>(), Err(RoomIdError::TooLong(9)));
        assert_eq!("AB-12".parse::<RoomId>(), Err(RoomIdError::InvalidChar('-')));
        assert_eq!("ÄB12".parse::<RoomId>(), Err(RoomIdError::InvalidChar('Ä')));
    }
}
