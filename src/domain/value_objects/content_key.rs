use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Length of a full SHA-1 key in hex characters
pub const FULL_KEY_LEN: usize = 40;

/// Length of a short-link key in hex characters
pub const SHORT_KEY_LEN: usize = 16;

/// Which flavour of key a caller expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Full 40-character digest, used for pastes
    #[default]
    Full,
    /// 16-character prefix of the digest, used for short links
    Short,
}

impl KeyKind {
    pub fn expected_len(self) -> usize {
        match self {
            KeyKind::Full => FULL_KEY_LEN,
            KeyKind::Short => SHORT_KEY_LEN,
        }
    }

    /// The kind whose keys are exactly `len` characters long
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            FULL_KEY_LEN => Some(KeyKind::Full),
            SHORT_KEY_LEN => Some(KeyKind::Short),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyKind::Full => write!(f, "full"),
            KeyKind::Short => write!(f, "short"),
        }
    }
}

/// Content-derived identifier: lowercase hex, 40 chars (full) or 16 chars (short).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Parse an untrusted key, checking length for `kind` and the hex charset.
    pub fn parse(raw: &str, kind: KeyKind) -> Result<Self, DomainError> {
        let expected = kind.expected_len();
        if raw.len() != expected {
            return Err(DomainError::invalid_key(
                raw,
                format!("expected {} hex characters, got {}", expected, raw.len()),
            ));
        }

        if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::invalid_key(raw, "hex characters only"));
        }

        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Wrap hex produced by the key codec. Caller guarantees well-formedness.
    pub(crate) fn from_trusted_hex(hex: String) -> Self {
        debug_assert!(hex.len() == FULL_KEY_LEN || hex.len() == SHORT_KEY_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> KeyKind {
        if self.0.len() == SHORT_KEY_LEN {
            KeyKind::Short
        } else {
            KeyKind::Full
        }
    }

    /// True if `self` is a prefix of (or equal to) `other`
    pub fn is_prefix_of(&self, other: &ContentKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
