use crate::domain::value_objects::{ContentKey, KeyKind};

/// Builds service-relative and remote URLs for stored content
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    cdn_endpoint: String,
}

impl UrlBuilder {
    pub fn new(cdn_endpoint: impl Into<String>) -> Self {
        let cdn_endpoint = cdn_endpoint.into();
        Self {
            cdn_endpoint: cdn_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// `/pastes/{key}` for full keys, `/l/{key}` for short links
    pub fn local_url(&self, key: &ContentKey) -> String {
        match key.kind() {
            KeyKind::Full => format!("/pastes/{}", key),
            KeyKind::Short => format!("/l/{}", key),
        }
    }

    pub fn raw_url(&self, key: &ContentKey) -> String {
        format!("/pastes/{}.raw", key)
    }

    pub fn remote_url(&self, key: &ContentKey) -> String {
        format!("{}/{}", self.cdn_endpoint, key)
    }
}
