use sha2::{Digest, Sha256};
use std::net::IpAddr;

/// Hashed identity of a requesting client.
///
/// Built from the first `X-Forwarded-For` entry, falling back to the peer
/// address. Only the SHA-256 hex of the origin is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    hashed: String,
}

impl ClientIdentity {
    pub fn from_origin(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Self {
        let forwarded = forwarded_for
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        let origin = match (forwarded, peer) {
            (Some(first), _) => first.to_string(),
            (None, Some(ip)) => ip.to_string(),
            (None, None) => "unknown".to_string(),
        };

        Self::from_raw(&origin)
    }

    fn from_raw(origin: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(origin.as_bytes());
        Self {
            hashed: hex::encode(hasher.finalize()),
        }
    }

    /// Hex digest used as the rate-limit bucket key
    pub fn hashed(&self) -> &str {
        &self.hashed
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 12 chars is plenty to correlate log lines
        f.write_str(&self.hashed[..12])
    }
}
