use rand::{Rng, rngs::OsRng};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// ICE: ufrag >= 4 chars; pwd >= 22 chars
const UFRAG_LEN: usize = 8;
const PWD_LEN: usize = 24;

/// `ice-ufrag` / `ice-pwd` pair for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCredentials {
    pub ufrag: String,
    pub pwd: String,
}

impl IceCredentials {
    pub fn new(ufrag: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            ufrag: ufrag.into(),
            pwd: pwd.into(),
        }
    }

    pub fn generate() -> Self {
        Self::new(gen_token(UFRAG_LEN), gen_token(PWD_LEN))
    }
}

fn gen_token(len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[OsRng.gen_range(0..ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials_have_ice_lengths() {
        let c = IceCredentials::generate();
        assert_eq!(c.ufrag.len(), UFRAG_LEN);
        assert_eq!(c.pwd.len(), PWD_LEN);
        assert!(c.pwd.chars().all(|ch| ch.is_ascii_alphanumeric()));
        assert_ne!(IceCredentials::generate(), c);
    }
}
