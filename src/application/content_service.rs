use bytes::Bytes;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::count_cache::CountCache;
use crate::application::errors::ContentError;
use crate::application::ports::ContentStore;
use crate::application::urls::UrlBuilder;
use crate::domain::entities::CountSnapshot;
use crate::domain::value_objects::{ContentKey, KeyKind};
use crate::domain::KeyCodec;

/// Number of key-striped locks serialising same-key writers
const WRITE_LOCK_STRIPES: usize = 64;

/// Default upper bound on a single paste
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 1024 * 1024;

/// Which store receives new content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteTarget {
    #[default]
    Local,
    Remote,
}

/// Result of a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub key: ContentKey,
    /// Service-relative URL for the key
    pub url: String,
    /// True only when this call stored the content
    pub created: bool,
    /// Public CDN URL, set only when the content was written remotely
    pub remote_url: Option<String>,
}

/// Content-addressed write/read orchestration.
///
/// Reads try the local store first, then the remote one. Writes go to the
/// configured target after an existence check on that same store.
pub struct ContentService {
    local: Arc<dyn ContentStore>,
    remote: Option<Arc<dyn ContentStore>>,
    target: WriteTarget,
    count_cache: Arc<CountCache>,
    container: String,
    urls: UrlBuilder,
    max_content_bytes: usize,
    write_locks: Vec<Mutex<()>>,
}

impl ContentService {
    pub fn new(
        local: Arc<dyn ContentStore>,
        count_cache: Arc<CountCache>,
        container: impl Into<String>,
        urls: UrlBuilder,
    ) -> Self {
        Self {
            local,
            remote: None,
            target: WriteTarget::Local,
            count_cache,
            container: container.into(),
            urls,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            write_locks: (0..WRITE_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Attach a remote store and choose where writes land.
    ///
    /// `WriteTarget::Remote` without a remote store is rejected by config
    /// validation before this is ever called.
    pub fn with_remote(mut self, remote: Arc<dyn ContentStore>, target: WriteTarget) -> Self {
        self.remote = Some(remote);
        self.target = target;
        self
    }

    pub fn with_max_content_bytes(mut self, max_content_bytes: usize) -> Self {
        self.max_content_bytes = max_content_bytes;
        self
    }

    pub fn max_content_bytes(&self) -> usize {
        self.max_content_bytes
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    fn remote_writer(&self) -> Option<&Arc<dyn ContentStore>> {
        match self.target {
            WriteTarget::Remote => self.remote.as_ref(),
            WriteTarget::Local => None,
        }
    }

    fn writer(&self) -> &Arc<dyn ContentStore> {
        self.remote_writer().unwrap_or(&self.local)
    }

    fn stripe(&self, key: &ContentKey) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.write_locks[(hasher.finish() as usize) % self.write_locks.len()]
    }

    /// Store `content` under its digest unless it is already present.
    pub async fn write(&self, content: &[u8], kind: KeyKind) -> Result<WriteOutcome, ContentError> {
        if content.is_empty() {
            return Err(ContentError::bad_request("Missing paste content."));
        }

        if content.len() > self.max_content_bytes {
            return Err(ContentError::bad_request_with(
                "Content too large.",
                json!({
                    "max_bytes": self.max_content_bytes,
                    "received_bytes": content.len(),
                }),
            ));
        }

        let key = KeyCodec::key_for(content, kind);
        let writer = self.writer();

        let created = {
            let _guard = self.stripe(&key).lock().await;

            match writer.get(&key).await? {
                Some(existing) => {
                    if kind == KeyKind::Short && &existing[..] != content {
                        // Two different contents share a 16-char prefix
                        warn!(key = %key, store = writer.name(), "Short key collision, keeping existing content");
                    }
                    false
                }
                None => {
                    let tag = writer.put(&key, Bytes::copy_from_slice(content)).await?;
                    info!(
                        key = %key,
                        kind = %kind,
                        store = writer.name(),
                        size_bytes = content.len(),
                        etag = tag.as_deref().unwrap_or(""),
                        "Stored content"
                    );
                    true
                }
            }
        };

        if !created {
            debug!(key = %key, store = writer.name(), "Content already present");
        }

        Ok(WriteOutcome {
            url: self.urls.local_url(&key),
            remote_url: self.remote_writer().map(|_| self.urls.remote_url(&key)),
            key,
            created,
        })
    }

    /// Fetch content for an untrusted key string.
    ///
    /// The key is validated before any store is consulted.
    pub async fn read(&self, raw_key: &str, kind: KeyKind) -> Result<Bytes, ContentError> {
        let key = ContentKey::parse(raw_key, kind)?;

        if let Some(content) = self.local.get(&key).await? {
            debug!(key = %key, store = self.local.name(), "Read hit");
            return Ok(content);
        }

        if let Some(remote) = &self.remote {
            if let Some(content) = remote.get(&key).await? {
                debug!(key = %key, store = remote.name(), "Read hit");
                return Ok(content);
            }
        }

        Err(ContentError::NotFound(key.to_string()))
    }

    /// Object count and total size, served from the count cache
    pub async fn count(&self) -> Result<CountSnapshot, ContentError> {
        Ok(self.count_cache.get(&self.container).await?)
    }
}
