use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for `RETRY_ATTEMPTS`
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Upper bound for `RETRY_BACKOFF`
pub const MAX_RETRY_BACKOFF: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Unknown CDN provider: {0:?} (expected \"openstack\" or \"memory\")")]
    UnknownProvider(String),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Remote object-storage provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdnProvider {
    OpenStack,
    Memory,
}

impl FromStr for CdnProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openstack" => Ok(CdnProvider::OpenStack),
            "memory" => Ok(CdnProvider::Memory),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Which store receives new content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Cdn,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "cdn" => Ok(StorageBackend::Cdn),
            other => Err(ConfigError::invalid(
                "STORAGE_BACKEND",
                format!("{:?} is not one of \"local\", \"cdn\"", other),
            )),
        }
    }
}

/// OpenStack Swift credentials. Either a Keystone password login or a
/// pre-issued token with its storage URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenStackConfig {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub user_domain_name: String,
    pub project_domain_name: String,
    pub region_name: Option<String>,
    pub interface: String,
    pub insecure: bool,
    pub auth_token: Option<String>,
    pub storage_url: Option<String>,
}

impl Default for OpenStackConfig {
    fn default() -> Self {
        Self {
            auth_url: None,
            username: None,
            password: None,
            project_name: None,
            user_domain_name: "Default".to_string(),
            project_domain_name: "Default".to_string(),
            region_name: None,
            interface: "public".to_string(),
            insecure: false,
            auth_token: None,
            storage_url: None,
        }
    }
}

impl OpenStackConfig {
    pub fn has_password_auth(&self) -> bool {
        self.auth_url.is_some()
            && self.username.is_some()
            && self.password.is_some()
            && self.project_name.is_some()
    }

    pub fn has_static_token(&self) -> bool {
        self.auth_token.is_some() && self.storage_url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paste_dir: PathBuf,
    pub cdn_endpoint: String,
    pub cdn_container_name: String,
    /// Empty means no remote store
    pub cdn_provider: String,
    pub storage_backend: StorageBackend,
    pub openstack: OpenStackConfig,
    pub rate_limit_file: PathBuf,
    pub rate_limit_rate: f64,
    pub rate_limit_per_secs: u64,
    pub rate_limit_lock_timeout_ms: u64,
    /// Disables rate limiting
    pub testing: bool,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub retry_backoff: f64,
    pub count_cache_ttl_secs: u64,
    pub remote_timeout_secs: u64,
    pub remote_connect_timeout_secs: u64,
    pub max_content_bytes: usize,
    pub listen_addr: String,
    /// Base for absolute URLs in responses; derived from `Host` when unset
    pub public_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paste_dir: PathBuf::from("/tmp/pasted"),
            cdn_endpoint: "http://pasted.tech:5000".to_string(),
            cdn_container_name: "pasted".to_string(),
            cdn_provider: String::new(),
            storage_backend: StorageBackend::Local,
            openstack: OpenStackConfig::default(),
            rate_limit_file: PathBuf::from("/tmp/pasted.ratelimit.json"),
            rate_limit_rate: 10.0,
            rate_limit_per_secs: 10,
            rate_limit_lock_timeout_ms: 5000,
            testing: false,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            retry_backoff: 1.0,
            count_cache_ttl_secs: 900,
            remote_timeout_secs: 10,
            remote_connect_timeout_secs: 5,
            max_content_bytes: 1024 * 1024,
            listen_addr: "0.0.0.0:8080".to_string(),
            public_base_url: None,
        }
    }
}

/// Environment variable holding an optional settings file path
pub const SETTINGS_ENV: &str = "PASTED_SETTINGS";

impl Config {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults, then the settings file (explicit path or `PASTED_SETTINGS`),
    /// then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env_path = std::env::var(SETTINGS_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML settings file, or YAML for `.yaml`/`.yml` files
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`, which maps variable names to values
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PASTE_DIR") {
            self.paste_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CDN_ENDPOINT") {
            self.cdn_endpoint = v;
        }
        if let Some(v) = lookup("CDN_CONTAINER_NAME") {
            self.cdn_container_name = v;
        }
        if let Some(v) = lookup("CDN_PROVIDER") {
            self.cdn_provider = v;
        }
        if let Some(v) = lookup("STORAGE_BACKEND") {
            self.storage_backend = v.parse()?;
        }

        let os = &mut self.openstack;
        set_opt(&mut os.auth_url, lookup("OS_AUTH_URL"));
        set_opt(&mut os.username, lookup("OS_USERNAME"));
        set_opt(&mut os.password, lookup("OS_PASSWORD"));
        set_opt(&mut os.project_name, lookup("OS_PROJECT_NAME"));
        set_opt(&mut os.region_name, lookup("OS_REGION_NAME"));
        set_opt(&mut os.auth_token, lookup("OS_AUTH_TOKEN"));
        set_opt(&mut os.storage_url, lookup("OS_STORAGE_URL"));
        if let Some(v) = lookup("OS_USER_DOMAIN_NAME") {
            os.user_domain_name = v;
        }
        if let Some(v) = lookup("OS_PROJECT_DOMAIN_NAME") {
            os.project_domain_name = v;
        }
        if let Some(v) = lookup("OS_INTERFACE") {
            os.interface = v;
        }
        if let Some(v) = lookup("OS_INSECURE") {
            os.insecure = parse_bool("OS_INSECURE", &v)?;
        }

        if let Some(v) = lookup("RATE_LIMIT_FILE") {
            self.rate_limit_file = PathBuf::from(v);
        }
        parse_into(&lookup, "RATE_LIMIT_RATE", &mut self.rate_limit_rate)?;
        parse_into(&lookup, "RATE_LIMIT_PER_SECS", &mut self.rate_limit_per_secs)?;
        parse_into(
            &lookup,
            "RATE_LIMIT_LOCK_TIMEOUT_MS",
            &mut self.rate_limit_lock_timeout_ms,
        )?;
        if let Some(v) = lookup("TESTING") {
            self.testing = parse_bool("TESTING", &v)?;
        }
        parse_into(&lookup, "RETRY_ATTEMPTS", &mut self.retry_attempts)?;
        parse_into(&lookup, "RETRY_DELAY_MS", &mut self.retry_delay_ms)?;
        parse_into(&lookup, "RETRY_BACKOFF", &mut self.retry_backoff)?;
        parse_into(&lookup, "COUNT_CACHE_TTL_SECS", &mut self.count_cache_ttl_secs)?;
        parse_into(&lookup, "REMOTE_TIMEOUT_SECS", &mut self.remote_timeout_secs)?;
        parse_into(
            &lookup,
            "REMOTE_CONNECT_TIMEOUT_SECS",
            &mut self.remote_connect_timeout_secs,
        )?;
        parse_into(&lookup, "MAX_CONTENT_BYTES", &mut self.max_content_bytes)?;
        if let Some(v) = lookup("LISTEN_ADDR") {
            self.listen_addr = v;
        }
        set_opt(&mut self.public_base_url, lookup("PUBLIC_BASE_URL"));

        Ok(())
    }

    /// Configured provider, `None` when no remote store is wanted
    pub fn provider(&self) -> Result<Option<CdnProvider>, ConfigError> {
        if self.cdn_provider.trim().is_empty() {
            return Ok(None);
        }
        self.cdn_provider.parse().map(Some)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.is_empty() {
            return Err(ConfigError::invalid("LISTEN_ADDR", "cannot be empty"));
        }

        if !(self.rate_limit_rate.is_finite() && self.rate_limit_rate > 0.0) {
            return Err(ConfigError::invalid(
                "RATE_LIMIT_RATE",
                "must be greater than zero",
            ));
        }

        if self.rate_limit_per_secs < 1 {
            return Err(ConfigError::invalid(
                "RATE_LIMIT_PER_SECS",
                "must be at least 1 second",
            ));
        }

        if !(1..=MAX_RETRY_ATTEMPTS).contains(&self.retry_attempts) {
            return Err(ConfigError::invalid(
                "RETRY_ATTEMPTS",
                format!("must be between 1 and {}", MAX_RETRY_ATTEMPTS),
            ));
        }

        if !(self.retry_backoff.is_finite()
            && (1.0..=MAX_RETRY_BACKOFF).contains(&self.retry_backoff))
        {
            return Err(ConfigError::invalid(
                "RETRY_BACKOFF",
                format!("must be between 1.0 and {}", MAX_RETRY_BACKOFF),
            ));
        }

        if self.count_cache_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "COUNT_CACHE_TTL_SECS",
                "must be greater than zero",
            ));
        }

        if self.max_content_bytes == 0 {
            return Err(ConfigError::invalid(
                "MAX_CONTENT_BYTES",
                "must be greater than zero",
            ));
        }

        let provider = self.provider()?;

        if self.storage_backend == StorageBackend::Cdn && provider.is_none() {
            return Err(ConfigError::invalid(
                "STORAGE_BACKEND",
                "\"cdn\" requires CDN_PROVIDER to be set",
            ));
        }

        if provider.is_some() && self.cdn_endpoint.trim().is_empty() {
            return Err(ConfigError::invalid(
                "CDN_ENDPOINT",
                "cannot be empty when a CDN provider is set",
            ));
        }

        if provider == Some(CdnProvider::OpenStack)
            && !self.openstack.has_password_auth()
            && !self.openstack.has_static_token()
        {
            return Err(ConfigError::invalid(
                "OS_AUTH_URL",
                "openstack needs OS_AUTH_URL, OS_USERNAME, OS_PASSWORD and OS_PROJECT_NAME, \
                 or OS_AUTH_TOKEN with OS_STORAGE_URL",
            ));
        }

        Ok(())
    }

    pub fn rate_limit_per(&self) -> Duration {
        Duration::from_secs(self.rate_limit_per_secs)
    }

    pub fn rate_limit_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.rate_limit_lock_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn count_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.count_cache_ttl_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn remote_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_connect_timeout_secs)
    }
}

fn set_opt(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *slot = Some(v);
    }
}

fn parse_into<T, F>(lookup: &F, name: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(name) {
        *slot = v
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, format!("{:?}: {}", v, e)))?;
    }
    Ok(())
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::invalid(
            name,
            format!("{:?} is not a boolean", other),
        )),
    }
}
