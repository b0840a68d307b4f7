//! Storage configuration types.

use danmu_shared::StorageSettings;

use super::error::StorageError;

/// Storage adapter configuration for an S3-compatible provider.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 endpoint URL.
    pub endpoint: String,
    /// S3 bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// S3 region.
    pub region: String,
    /// Base URL for public file links, without trailing slash.
    pub public_base_url: String,
    /// Presigned upload URL TTL in seconds (default: 300 = 5 minutes).
    pub presign_upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
}

impl StorageConfig {
    /// Default upload TTL: 5 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 300;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a config with default TTLs. The public base URL defaults to the
    /// virtual-host style bucket URL on the endpoint host.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        let settings = StorageSettings {
            endpoint: endpoint.into(),
            region: region.into(),
            bucket: Some(bucket.into()),
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            public_base_url: None,
        };
        Self::from_parts(&settings)
    }

    /// Build a config from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing fields when the bucket
    /// or credentials are absent.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        if !settings.is_complete() {
            return Err(StorageError::configuration(format!(
                "missing storage settings: {}",
                settings.missing_fields().join(", ")
            )));
        }
        Ok(Self::from_parts(settings))
    }

    fn from_parts(settings: &StorageSettings) -> Self {
        let bucket = settings.bucket.clone().unwrap_or_default();
        Self {
            public_base_url: settings
                .resolved_public_base_url()
                .unwrap_or_else(|| settings.endpoint.trim_end_matches('/').to_string()),
            endpoint: settings.endpoint.clone(),
            bucket,
            access_key_id: settings.access_key_id.clone().unwrap_or_default(),
            secret_access_key: settings.secret_access_key.clone().unwrap_or_default(),
            region: settings.region.clone(),
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
        }
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Public URL of an object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig::new(
            "https://s3.bitiful.net",
            "danmu-files",
            "access_key",
            "secret_key",
            "cn-east-1",
        )
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = config();
        assert_eq!(config.bucket, "danmu-files");
        assert_eq!(config.presign_upload_ttl_secs, 300);
        assert_eq!(config.presign_download_ttl_secs, 3600);
        assert_eq!(config.public_base_url, "https://danmu-files.s3.bitiful.net");
    }

    #[test]
    fn test_public_url() {
        let config = config();
        assert_eq!(
            config.public_url("uploads/anonymous/1-abc.png"),
            "https://danmu-files.s3.bitiful.net/uploads/anonymous/1-abc.png"
        );

        let config = config.with_public_base_url("https://cdn.example.com/");
        assert_eq!(config.public_url("k"), "https://cdn.example.com/k");
    }

    #[test]
    fn test_from_settings_missing_credentials() {
        let settings = StorageSettings {
            bucket: Some("danmu-files".into()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        match err {
            StorageError::Configuration(msg) => {
                assert!(msg.contains("access_key_id"));
                assert!(msg.contains("secret_access_key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_settings_complete() {
        let settings = StorageSettings {
            bucket: Some("b".into()),
            access_key_id: Some("ak".into()),
            secret_access_key: Some("sk".into()),
            public_base_url: Some("https://files.example.com".into()),
            ..StorageSettings::default()
        };
        let config = StorageConfig::from_settings(&settings).expect("complete settings");
        assert_eq!(config.bucket, "b");
        assert_eq!(config.region, "auto");
        assert_eq!(config.public_base_url, "https://files.example.com");
    }
}
