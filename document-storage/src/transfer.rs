//! Byte transfer over signed URLs

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};
use tracing::debug;

use crate::error::{ErrorKind, StoreError, StoreResult};

/// Moves bytes to and from URLs issued by an [`ObjectBackend`](crate::ObjectBackend)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlTransfer: Send + Sync {
    /// PUT `data` to `url` with a `Content-Type` header
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> StoreResult<()>;

    /// GET the full body at `url`
    async fn get(&self, url: &str) -> StoreResult<Bytes>;
}

/// Plain HTTP transfer using `reqwest`
pub struct HttpTransfer {
    http_client: Client,
}

impl HttpTransfer {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http_client })
    }

    async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::new(
            ErrorKind::from_status(status.as_u16()),
            anyhow!("store responded {}: {}", status, body),
        ))
    }
}

fn classify(err: reqwest::Error) -> StoreError {
    match err.status() {
        Some(status) => StoreError::new(ErrorKind::from_status(status.as_u16()), err),
        None => StoreError::transport(err),
    }
}

#[async_trait]
impl UrlTransfer for HttpTransfer {
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> StoreResult<()> {
        debug!(size = data.len(), content_type, "PUT to signed URL");

        let response = self
            .http_client
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(classify)?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn get(&self, url: &str) -> StoreResult<Bytes> {
        debug!("GET from signed URL");

        let response = self.http_client.get(url).send().await.map_err(classify)?;
        let response = Self::check_status(response).await?;

        response.bytes().await.map_err(StoreError::transport)
    }
}
