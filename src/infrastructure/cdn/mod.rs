//! Remote object-storage providers

mod keystone;
mod memory;
mod swift;

pub use keystone::{KeystoneAuth, KeystoneSettings, SwiftCredentials};
pub use memory::InMemoryObjectStore;
pub use swift::{SwiftObjectStore, TokenSource};

use std::sync::Arc;
use tracing::info;

use crate::application::ports::{ObjectStore, StorageError};
use crate::config::{CdnProvider, Config, ConfigError, OpenStackConfig};

pub(crate) fn map_transport_error(operation: &str, e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout(format!("{}: {}", operation, e))
    } else {
        StorageError::Transport(format!("{}: {}", operation, e))
    }
}

/// Build the configured provider, or `None` when no CDN is configured
pub fn build_object_store(config: &Config) -> Result<Option<Arc<dyn ObjectStore>>, ConfigError> {
    let store: Arc<dyn ObjectStore> = match config.provider()? {
        None => return Ok(None),
        Some(CdnProvider::Memory) => Arc::new(InMemoryObjectStore::new()),
        Some(CdnProvider::OpenStack) => {
            let client = reqwest::Client::builder()
                .timeout(config.remote_timeout())
                .connect_timeout(config.remote_connect_timeout())
                .danger_accept_invalid_certs(config.openstack.insecure)
                .build()
                .map_err(|e| ConfigError::Invalid {
                    field: "CDN_PROVIDER",
                    reason: format!("failed to build HTTP client: {}", e),
                })?;

            let tokens = token_source(client.clone(), &config.openstack)?;
            Arc::new(SwiftObjectStore::new(
                client,
                config.cdn_endpoint.clone(),
                tokens,
            ))
        }
    };

    info!(
        provider = store.provider(),
        container = %config.cdn_container_name,
        "Object store configured"
    );
    Ok(Some(store))
}

fn token_source(client: reqwest::Client, os: &OpenStackConfig) -> Result<TokenSource, ConfigError> {
    if let (Some(token), Some(storage_url)) = (&os.auth_token, &os.storage_url) {
        return Ok(TokenSource::Static(SwiftCredentials {
            token: token.clone(),
            storage_url: storage_url.trim_end_matches('/').to_string(),
        }));
    }

    match (&os.auth_url, &os.username, &os.password, &os.project_name) {
        (Some(auth_url), Some(username), Some(password), Some(project_name)) => {
            Ok(TokenSource::Keystone(KeystoneAuth::new(
                client,
                KeystoneSettings {
                    auth_url: auth_url.clone(),
                    username: username.clone(),
                    password: password.clone(),
                    project_name: project_name.clone(),
                    user_domain_name: os.user_domain_name.clone(),
                    project_domain_name: os.project_domain_name.clone(),
                    region_name: os.region_name.clone(),
                    interface: os.interface.clone(),
                },
            )))
        }
        _ => Err(ConfigError::Invalid {
            field: "OS_AUTH_URL",
            reason: "openstack credentials are incomplete".to_string(),
        }),
    }
}
