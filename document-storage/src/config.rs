/// Storage configuration for the document gateway
///
/// Connection settings (endpoint, credentials, bucket) must come from the
/// environment; everything else has a default.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Signed URL expiry for uploads and downloads
pub const DEFAULT_URL_EXPIRY_SECONDS: u64 = 3600;
/// Signed URL expiry used internally by the presigned read path
pub const DEFAULT_READ_URL_EXPIRY_SECONDS: u64 = 60;
/// SigV4 refuses presigned URLs valid for more than seven days
pub const MAX_URL_EXPIRY_SECONDS: u64 = 7 * 24 * 3600;

/// How document bytes travel between this service and the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Bytes are streamed through the server; URLs are plain object URLs
    Direct,
    /// Bytes move over short-lived signed URLs
    Presigned,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Direct => "direct",
            TransferMode::Presigned => "presigned",
        }
    }
}

impl FromStr for TransferMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(TransferMode::Direct),
            "presigned" | "signed" => Ok(TransferMode::Presigned),
            other => anyhow::bail!("Unknown transfer mode: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub path_style: bool,
    pub key_prefix: String,
    pub transfer_mode: TransferMode,
    pub url_expiry_seconds: u64,
    pub read_url_expiry_seconds: u64,
    pub transfer_timeout_seconds: u64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
            access_key: env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
            secret_key: env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
            path_style: env::var("S3_PATH_STYLE")
                .unwrap_or_else(|_| "true".to_string())
                .trim()
                .parse()
                .context("Invalid S3_PATH_STYLE")?,
            key_prefix: env::var("S3_KEY_PREFIX").unwrap_or_default(),
            transfer_mode: env::var("STORAGE_TRANSFER_MODE")
                .unwrap_or_else(|_| "direct".to_string())
                .parse()
                .context("Invalid STORAGE_TRANSFER_MODE")?,
            url_expiry_seconds: env::var("STORAGE_URL_EXPIRY_SECONDS")
                .unwrap_or_else(|_| DEFAULT_URL_EXPIRY_SECONDS.to_string())
                .parse()
                .context("Invalid STORAGE_URL_EXPIRY_SECONDS")?,
            read_url_expiry_seconds: env::var("STORAGE_READ_URL_EXPIRY_SECONDS")
                .unwrap_or_else(|_| DEFAULT_READ_URL_EXPIRY_SECONDS.to_string())
                .parse()
                .context("Invalid STORAGE_READ_URL_EXPIRY_SECONDS")?,
            transfer_timeout_seconds: env::var("S3_TRANSFER_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid S3_TRANSFER_TIMEOUT_SECONDS")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            anyhow::bail!("S3 bucket name cannot be empty");
        }
        let endpoint = url::Url::parse(&self.endpoint)
            .with_context(|| format!("S3 endpoint is not a valid URL: {}", self.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            anyhow::bail!(
                "S3 endpoint must be an http(s) URL with a host: {}",
                self.endpoint
            );
        }
        for (name, secs) in [
            ("URL expiry", self.url_expiry_seconds),
            ("Read URL expiry", self.read_url_expiry_seconds),
        ] {
            if secs == 0 || secs > MAX_URL_EXPIRY_SECONDS {
                anyhow::bail!(
                    "{} must be between 1 and {} seconds, got {}",
                    name,
                    MAX_URL_EXPIRY_SECONDS,
                    secs
                );
            }
        }
        if self.transfer_timeout_seconds == 0 {
            anyhow::bail!("Transfer timeout must be greater than 0");
        }
        Ok(())
    }

    pub fn url_expiry(&self) -> Duration {
        Duration::from_secs(self.url_expiry_seconds)
    }

    pub fn read_url_expiry(&self) -> Duration {
        Duration::from_secs(self.read_url_expiry_seconds)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_seconds)
    }

    /// Object key for a document id, under the configured prefix
    pub fn object_key(&self, doc_id: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            doc_id.to_string()
        } else {
            format!("{}/{}", prefix, doc_id)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(), // MinIO default
            region: "us-east-1".to_string(),
            bucket: "course-documents".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
            key_prefix: String::new(),
            transfer_mode: TransferMode::Direct,
            url_expiry_seconds: DEFAULT_URL_EXPIRY_SECONDS,
            read_url_expiry_seconds: DEFAULT_READ_URL_EXPIRY_SECONDS,
            transfer_timeout_seconds: 300,
        }
    }
}
