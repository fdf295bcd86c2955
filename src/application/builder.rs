use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::api::router::AppState;
use crate::application::content_service::{ContentService, WriteTarget};
use crate::application::count_cache::CountCache;
use crate::application::ports::{Clock, ContentStore, ObjectStore, StorageError, SystemClock};
use crate::application::rate_limiter::{RateLimiter, ThrottlePolicy};
use crate::application::remote_store::RemoteStore;
use crate::application::retry::RetryPolicy;
use crate::application::urls::UrlBuilder;
use crate::config::{Config, ConfigError, StorageBackend};
use crate::domain::entities::ThrottleLimits;
use crate::infrastructure::{
    cdn::build_object_store, rate_limit::FileBucketStore, storage::LocalFilesystemStore,
};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage initialisation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("{0} not initialized")]
    Missing(&'static str),
}

/// Application builder for dependency injection and setup
pub struct ApplicationBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
    local: Option<Arc<dyn ContentStore>>,
    objects: Option<Arc<dyn ObjectStore>>,
    limiter: Option<Arc<RateLimiter>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            local: None,
            objects: None,
            limiter: None,
        }
    }

    /// Replace the wall clock used by the count cache and rate limiter
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use this object store instead of the configured provider
    pub fn with_object_store(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Create the paste directory and resolve the remote provider
    pub async fn with_storage(mut self) -> Result<Self, BuildError> {
        let local = LocalFilesystemStore::new(self.config.paste_dir.clone());
        local.init().await?;
        info!(root = ?self.config.paste_dir, "Local store initialized");
        self.local = Some(Arc::new(local));

        if self.objects.is_none() {
            self.objects = build_object_store(&self.config)?;
        }

        Ok(self)
    }

    /// File-backed rate limiter, disabled in testing mode
    pub fn with_rate_limiter(mut self) -> Self {
        let policy = if self.config.testing {
            info!("Rate limiting disabled (testing mode)");
            ThrottlePolicy::Disabled
        } else {
            ThrottlePolicy::Enforced(ThrottleLimits::new(
                self.config.rate_limit_rate,
                self.config.rate_limit_per(),
            ))
        };

        let store = FileBucketStore::new(
            self.config.rate_limit_file.clone(),
            self.config.rate_limit_lock_timeout(),
        );

        self.limiter = Some(Arc::new(RateLimiter::new(
            Arc::new(store),
            policy,
            Arc::clone(&self.clock),
        )));
        self
    }

    /// Build application state
    pub fn build(self) -> Result<AppState, BuildError> {
        let local = self.local.ok_or(BuildError::Missing("Local store"))?;
        let limiter = self.limiter.ok_or(BuildError::Missing("Rate limiter"))?;

        let remote: Option<Arc<dyn ContentStore>> = self.objects.map(|objects| {
            let retry = RetryPolicy::new(
                self.config.retry_attempts,
                self.config.retry_delay(),
                self.config.retry_backoff,
            );
            Arc::new(RemoteStore::new(
                objects,
                self.config.cdn_container_name.clone(),
                retry,
            )) as Arc<dyn ContentStore>
        });

        let target = match self.config.storage_backend {
            StorageBackend::Local => WriteTarget::Local,
            StorageBackend::Cdn if remote.is_some() => WriteTarget::Remote,
            StorageBackend::Cdn => return Err(BuildError::Missing("Object store")),
        };

        // Stats come from the remote container when there is one
        let count_source = remote.clone().unwrap_or_else(|| Arc::clone(&local));
        let count_cache = Arc::new(CountCache::new(
            count_source,
            Arc::clone(&self.clock),
            self.config.count_cache_ttl(),
        ));

        let mut content = ContentService::new(
            local,
            count_cache,
            self.config.cdn_container_name.clone(),
            UrlBuilder::new(self.config.cdn_endpoint.clone()),
        )
        .with_max_content_bytes(self.config.max_content_bytes);

        if let Some(remote) = remote {
            content = content.with_remote(remote, target);
        }

        info!(?target, "Application layer initialized");

        Ok(AppState {
            content: Arc::new(content),
            limiter,
            public_base_url: self
                .config
                .public_base_url
                .as_ref()
                .map(|base| base.trim_end_matches('/').to_string()),
        })
    }

    /// Storage, rate limiter and state in one step
    pub async fn from_config(config: Config) -> Result<AppState, BuildError> {
        Self::new(config).with_storage().await?.with_rate_limiter().build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
