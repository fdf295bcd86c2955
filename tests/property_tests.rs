//! Property-based tests using proptest
//!
//! Key codec and key parsing invariants over random inputs.

use proptest::prelude::*;
use std::time::Duration;

use pasted::domain::entities::{Admission, RateBucket, ThrottleLimits};
use pasted::domain::value_objects::{ContentKey, KeyKind, FULL_KEY_LEN, SHORT_KEY_LEN};
use pasted::KeyCodec;

fn is_lower_hex(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

proptest! {
    #[test]
    fn digest_is_deterministic_lowercase_hex(content in prop::collection::vec(any::<u8>(), 0..4096)) {
        let a = KeyCodec::digest(&content);
        let b = KeyCodec::digest(&content);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.as_str().len(), FULL_KEY_LEN);
        prop_assert!(is_lower_hex(a.as_str()));
    }

    #[test]
    fn short_key_is_prefix_of_full(content in prop::collection::vec(any::<u8>(), 1..2048)) {
        let full = KeyCodec::key_for(&content, KeyKind::Full);
        let short = KeyCodec::key_for(&content, KeyKind::Short);

        prop_assert_eq!(short.as_str().len(), SHORT_KEY_LEN);
        prop_assert!(short.is_prefix_of(&full));
        prop_assert_eq!(short.kind(), KeyKind::Short);
        prop_assert_eq!(KeyCodec::truncate(&full, SHORT_KEY_LEN).unwrap(), short);
    }

    #[test]
    fn truncate_respects_bounds(n in 0usize..64) {
        let full = KeyCodec::digest(b"hello");
        let result = KeyCodec::truncate(&full, n);

        if n == FULL_KEY_LEN || n == SHORT_KEY_LEN {
            let key = result.unwrap();
            prop_assert_eq!(key.as_str(), &full.as_str()[..n]);
            prop_assert_eq!(key.kind().expected_len(), n);
            prop_assert_eq!(ContentKey::parse(key.as_str(), key.kind()).unwrap(), key);
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn parse_accepts_any_hex_of_right_length(raw in "[0-9a-fA-F]{40}") {
        let key = ContentKey::parse(&raw, KeyKind::Full).unwrap();
        prop_assert_eq!(key.as_str(), raw.to_ascii_lowercase());
        prop_assert!(ContentKey::parse(&raw, KeyKind::Short).is_err());
    }

    #[test]
    fn parse_rejects_wrong_length(raw in "[0-9a-f]{0,60}") {
        prop_assume!(raw.len() != FULL_KEY_LEN);
        prop_assert!(ContentKey::parse(&raw, KeyKind::Full).is_err());
    }

    #[test]
    fn parse_rejects_path_like_keys(prefix in "[0-9a-f]{10}", suffix in "[0-9a-f]{27}") {
        let raw = format!("{}/..{}", prefix, suffix);
        prop_assert_eq!(raw.len(), FULL_KEY_LEN);
        prop_assert!(ContentKey::parse(&raw, KeyKind::Full).is_err());
    }

    #[test]
    fn bucket_never_admits_more_than_rate_in_one_window(
        rate in 1u32..50,
        gaps in prop::collection::vec(0.0f64..0.1, 1..200),
    ) {
        let limits = ThrottleLimits::new(rate as f64, Duration::from_secs(10));
        let mut now = 1_700_000_000.0;
        let mut bucket = RateBucket::fresh(&limits, now);
        let mut admitted = 0u32;

        // No gap exceeds `per`, so the allowance never refills
        for gap in gaps {
            now += gap;
            if bucket.check(&limits, now) == Admission::Admitted {
                admitted += 1;
            }
        }

        prop_assert!(admitted <= rate);
    }
}

#[test]
fn hello_has_known_digest() {
    assert_eq!(
        KeyCodec::digest(b"hello").as_str(),
        "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    );
}
