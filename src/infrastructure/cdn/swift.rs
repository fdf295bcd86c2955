use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::HeaderMap, Client, StatusCode};
use tracing::{debug, warn};

use crate::application::ports::{ObjectStore, ObjectTag, StorageError, StoreStats};
use crate::infrastructure::cdn::keystone::{KeystoneAuth, SwiftCredentials};
use crate::infrastructure::cdn::map_transport_error;

const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const OBJECT_COUNT_HEADER: &str = "x-container-object-count";
const BYTES_USED_HEADER: &str = "x-container-bytes-used";

/// Where Swift tokens come from
pub enum TokenSource {
    /// Pre-issued token and storage URL
    Static(SwiftCredentials),
    Keystone(KeystoneAuth),
}

impl TokenSource {
    async fn credentials(&self) -> Result<SwiftCredentials, StorageError> {
        match self {
            TokenSource::Static(credentials) => Ok(credentials.clone()),
            TokenSource::Keystone(auth) => auth.credentials().await,
        }
    }

    async fn invalidate(&self) {
        if let TokenSource::Keystone(auth) = self {
            auth.invalidate().await;
        }
    }
}

/// OpenStack Swift provider.
///
/// Uploads and container stats go to the authenticated storage URL.
/// Reads go to the public CDN endpoint without a token.
pub struct SwiftObjectStore {
    client: Client,
    cdn_endpoint: String,
    tokens: TokenSource,
}

impl SwiftObjectStore {
    pub fn new(client: Client, cdn_endpoint: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            client,
            cdn_endpoint: cdn_endpoint.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Turn a non-success status into an error, dropping the token on 401
    /// so the next attempt logs in again.
    async fn check_status(
        &self,
        operation: &'static str,
        status: StatusCode,
    ) -> Result<(), StorageError> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!(operation, "Swift rejected token");
            self.tokens.invalidate().await;
        }
        Err(StorageError::RemoteStatus {
            operation,
            status: status.as_u16(),
        })
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Result<u64, StorageError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| StorageError::InvalidResponse(format!("missing or invalid {}", name)))
}

#[async_trait]
impl ObjectStore for SwiftObjectStore {
    fn provider(&self) -> &'static str {
        "openstack"
    }

    async fn upload(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
    ) -> Result<ObjectTag, StorageError> {
        let credentials = self.tokens.credentials().await?;
        let url = format!("{}/{}/{}", credentials.storage_url, container, key);

        let response = self
            .client
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &credentials.token)
            .body(content)
            .send()
            .await
            .map_err(|e| map_transport_error("upload", e))?;

        self.check_status("upload", response.status()).await?;

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string())
            .ok_or_else(|| StorageError::InvalidResponse("upload response had no ETag".into()))?;

        debug!(container, key, etag = %etag, "Swift upload complete");
        Ok(etag)
    }

    async fn fetch_by_key(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let url = format!("{}/{}", self.cdn_endpoint, key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_transport_error("fetch", e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(key, status = status.as_u16(), "CDN fetch missed");
            return Ok(None);
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| map_transport_error("fetch", e))?;
        Ok(Some(content))
    }

    async fn stat_container(&self, container: &str) -> Result<StoreStats, StorageError> {
        let credentials = self.tokens.credentials().await?;
        let url = format!("{}/{}", credentials.storage_url, container);

        let response = self
            .client
            .head(&url)
            .header(AUTH_TOKEN_HEADER, &credentials.token)
            .send()
            .await
            .map_err(|e| map_transport_error("stat_container", e))?;

        self.check_status("stat_container", response.status()).await?;

        let headers = response.headers();
        Ok(StoreStats {
            object_count: header_u64(headers, OBJECT_COUNT_HEADER)?,
            total_size_bytes: header_u64(headers, BYTES_USED_HEADER)?,
        })
    }
}
