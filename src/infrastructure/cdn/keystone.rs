//! Keystone v3 password authentication for Swift.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::application::ports::StorageError;
use crate::infrastructure::cdn::map_transport_error;

/// Tokens are refreshed this long before Keystone says they expire
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// An issued token and the object-store endpoint it is valid for
#[derive(Debug, Clone, PartialEq)]
pub struct SwiftCredentials {
    pub token: String,
    pub storage_url: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    credentials: SwiftCredentials,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::minutes(EXPIRY_MARGIN_MINUTES)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogEndpoint {
    pub interface: String,
    pub url: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
}

/// Pick the `object-store` URL matching `interface` and, when given, `region`
pub(crate) fn select_endpoint(
    catalog: &[CatalogEntry],
    interface: &str,
    region: Option<&str>,
) -> Option<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == "object-store")
        .flat_map(|entry| entry.endpoints.iter())
        .find(|ep| {
            ep.interface == interface
                && region.map_or(true, |r| {
                    ep.region.as_deref() == Some(r) || ep.region_id.as_deref() == Some(r)
                })
        })
        .map(|ep| ep.url.trim_end_matches('/').to_string())
}

#[derive(Debug, Clone)]
pub struct KeystoneSettings {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub user_domain_name: String,
    pub project_domain_name: String,
    pub region_name: Option<String>,
    pub interface: String,
}

/// Logs in with a password and caches the scoped token until shortly
/// before it expires.
pub struct KeystoneAuth {
    client: Client,
    settings: KeystoneSettings,
    cached: RwLock<Option<CachedToken>>,
}

impl KeystoneAuth {
    pub fn new(client: Client, settings: KeystoneSettings) -> Self {
        Self {
            client,
            settings,
            cached: RwLock::new(None),
        }
    }

    /// Current credentials, logging in when the cache is empty or stale
    pub async fn credentials(&self) -> Result<SwiftCredentials, StorageError> {
        let now = Utc::now();
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_usable(now) {
                return Ok(cached.credentials.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // another task may have logged in while we waited for the write lock
        if let Some(cached) = slot.as_ref() {
            if cached.is_usable(now) {
                return Ok(cached.credentials.clone());
            }
        }

        let fresh = self.login().await?;
        let credentials = fresh.credentials.clone();
        *slot = Some(fresh);
        Ok(credentials)
    }

    /// Drop the cached token, e.g. after the object store answered 401
    pub async fn invalidate(&self) {
        if self.cached.write().await.take().is_some() {
            debug!("Discarded cached Keystone token");
        }
    }

    fn request_body(&self) -> serde_json::Value {
        let s = &self.settings;
        json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": s.username,
                            "domain": { "name": s.user_domain_name },
                            "password": s.password,
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": s.project_name,
                        "domain": { "name": s.project_domain_name },
                    }
                }
            }
        })
    }

    async fn login(&self) -> Result<CachedToken, StorageError> {
        let url = format!("{}/auth/tokens", self.settings.auth_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&self.request_body())
            .send()
            .await
            .map_err(|e| map_transport_error("keystone_login", e))?;

        let status = response.status();
        if status.is_server_error() {
            // identity service fault, worth another attempt
            return Err(StorageError::RemoteStatus {
                operation: "keystone_login",
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(StorageError::Auth(format!(
                "Keystone returned HTTP {} for user {}",
                status.as_u16(),
                self.settings.username
            )));
        }

        let token = response
            .headers()
            .get("x-subject-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidResponse("missing X-Subject-Token".into()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("token body: {}", e)))?;

        let storage_url = select_endpoint(
            &body.token.catalog,
            &self.settings.interface,
            self.settings.region_name.as_deref(),
        )
        .ok_or_else(|| {
            StorageError::Auth(format!(
                "no object-store endpoint for interface {:?} region {:?}",
                self.settings.interface, self.settings.region_name
            ))
        })?;

        info!(
            storage_url = %storage_url,
            expires_at = %body.token.expires_at,
            "Obtained Keystone token"
        );

        Ok(CachedToken {
            credentials: SwiftCredentials { token, storage_url },
            expires_at: body.token.expires_at,
        })
    }
}
