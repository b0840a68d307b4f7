//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// S3-compatible object storage settings.
///
/// Credentials are optional so the server can boot without them; storage
/// endpoints then answer with a configuration error.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// S3 endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// S3 region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name.
    pub bucket: Option<String>,
    /// Access key ID.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
    /// Base URL used to build public file URLs. Defaults to the
    /// virtual-host style URL of the bucket on the endpoint host.
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            public_base_url: None,
        }
    }
}

fn default_endpoint() -> String {
    "https://s3.bitiful.net".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

impl StorageSettings {
    /// Returns `true` when bucket and both credentials are present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.bucket, &self.access_key_id, &self.secret_access_key]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Names of the missing required settings.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("bucket", &self.bucket),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Base URL for public file links.
    #[must_use]
    pub fn resolved_public_base_url(&self) -> Option<String> {
        if let Some(url) = &self.public_base_url {
            return Some(url.trim_end_matches('/').to_string());
        }
        let bucket = self.bucket.as_deref()?;
        let (scheme, host) = self
            .endpoint
            .split_once("://")
            .unwrap_or(("https", self.endpoint.as_str()));
        Some(format!(
            "{scheme}://{bucket}.{}",
            host.trim_end_matches('/')
        ))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DANMU").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
