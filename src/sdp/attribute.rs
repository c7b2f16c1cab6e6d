use std::fmt;

/// An `a=` line: a key with an optional `:value`.
///
/// Common examples in our artifacts: `ice-ufrag`, `sctp-port`, `candidate`,
/// `end-of-candidates` (a flag, no value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    key: String,
    value: Option<String>,
}

impl Attribute {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Attribute without a value, e.g. `a=end-of-candidates`.
    pub fn flag<K: Into<String>>(key: K) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Parses the text after `a=`.
    pub fn parse(rest: &str) -> Self {
        match rest.split_once(':') {
            Some((k, v)) => Self::new(k.trim(), v.trim()),
            None => Self::flag(rest.trim()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}:{}", self.key, v),
            None => f.write_str(&self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_colon_only() {
        let a = Attribute::parse("candidate:abc 1 udp 2130706431 127.0.0.1 5000 typ host");
        assert_eq!(a.key(), "candidate");
        assert_eq!(a.value(), Some("abc 1 udp 2130706431 127.0.0.1 5000 typ host"));
    }

    #[test]
    fn flag_round_trips_without_colon() {
        let a = Attribute::parse(" end-of-candidates ");
        assert_eq!(a, Attribute::flag("end-of-candidates"));
        assert_eq!(a.to_string(), "end-of-candidates");
    }
}
