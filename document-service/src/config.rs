/// Configuration module for the Document Service
///
/// Everything is read from the environment (after loading `.env` if present):
/// - Server settings (listen address, upload limit, CORS)
/// - Storage settings, see [`StorageConfig`]
/// - Logging settings

use std::env;

use anyhow::{Context, Result};
use document_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use shared::observability::LogConfig;

const SERVICE_NAME: &str = "document-service";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LogConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            server: ServerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            logging: LogConfig::from_env(SERVICE_NAME).context("Invalid logging configuration")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size_mb: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8086".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid MAX_UPLOAD_SIZE_MB")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        if self.max_upload_size_mb == 0 {
            anyhow::bail!("Max upload size must be greater than 0");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8086,
            max_upload_size_mb: 100,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}
