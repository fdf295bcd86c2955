use sha1::{Digest, Sha1};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ContentKey, KeyKind};

/// Derives content keys from raw bytes.
///
/// Keys are the lowercase hex SHA-1 of the content. Short links use the
/// first 16 characters of that digest, which trades collision resistance
/// (64 bits instead of 160) for a shorter URL.
pub struct KeyCodec;

impl KeyCodec {
    /// SHA-1 digest of `content` as 40 lowercase hex characters.
    pub fn digest(content: &[u8]) -> ContentKey {
        let mut hasher = Sha1::new();
        hasher.update(content);
        ContentKey::from_trusted_hex(hex::encode(hasher.finalize()))
    }

    /// First `n` characters of a key.
    ///
    /// `n` must be the length of a [`KeyKind`], so every truncated key can
    /// be routed and parsed back.
    pub fn truncate(key: &ContentKey, n: usize) -> Result<ContentKey, DomainError> {
        match KeyKind::from_len(n) {
            Some(_) if n <= key.as_str().len() => {
                Ok(ContentKey::from_trusted_hex(key.as_str()[..n].to_string()))
            }
            _ => Err(DomainError::InvalidTruncation { length: n }),
        }
    }

    /// Digest `content` and shape the key for `kind`.
    pub fn key_for(content: &[u8], kind: KeyKind) -> ContentKey {
        let full = Self::digest(content);
        match kind {
            KeyKind::Full => full,
            KeyKind::Short => ContentKey::from_trusted_hex(
                full.as_str()[..kind.expected_len()].to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SHORT_KEY_LEN;

    #[test]
    fn test_digest_known_value() {
        let key = KeyCodec::digest(b"hello");
        assert_eq!(key.as_str(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(KeyCodec::digest(b"same"), KeyCodec::digest(b"same"));
    }

    #[test]
    fn test_distinct_inputs_give_distinct_keys() {
        let a = KeyCodec::digest(b"foo");
        let b = KeyCodec::digest(b"bar");
        assert_eq!(a.as_str().len(), 40);
        assert_eq!(b.as_str().len(), 40);
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncate_is_prefix() {
        let full = KeyCodec::digest(b"https://example.com");
        let short = KeyCodec::truncate(&full, SHORT_KEY_LEN).unwrap();
        assert_eq!(short.as_str().len(), 16);
        assert!(short.is_prefix_of(&full));
        assert_eq!(short.kind(), KeyKind::Short);
    }

    #[test]
    fn test_truncate_bounds() {
        let full = KeyCodec::digest(b"x");
        assert!(KeyCodec::truncate(&full, 0).is_err());
        assert!(KeyCodec::truncate(&full, 41).is_err());
        assert_eq!(KeyCodec::truncate(&full, 40).unwrap(), full);
    }

    #[test]
    fn test_truncate_rejects_lengths_without_a_kind() {
        let full = KeyCodec::digest(b"x");
        for n in [1, 8, 15, 17, 39] {
            let err = KeyCodec::truncate(&full, n).unwrap_err();
            assert_eq!(err, DomainError::InvalidTruncation { length: n });
        }

        // a short key cannot grow back into a full one
        let short = KeyCodec::truncate(&full, SHORT_KEY_LEN).unwrap();
        assert!(KeyCodec::truncate(&short, 40).is_err());
        assert_eq!(KeyCodec::truncate(&short, 16).unwrap(), short);
    }

    #[test]
    fn test_key_for_short_matches_truncate() {
        let content = b"https://rust-lang.org";
        let short = KeyCodec::key_for(content, KeyKind::Short);
        let expected = KeyCodec::truncate(&KeyCodec::digest(content), 16).unwrap();
        assert_eq!(short, expected);
    }
}
