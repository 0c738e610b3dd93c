//! In-memory object store (for tests and local development)

use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::backend::ObjectBackend;
use crate::error::{ErrorKind, StoreError, StoreResult};
use crate::transfer::UrlTransfer;
use crate::types::ObjectMetadata;

const SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: chrono::DateTime<Utc>,
}

/// Bucket kept in a `HashMap`. Not persistent; data is lost on drop.
///
/// URLs it issues use the `memory://{bucket}/{key}` form and can only be
/// dereferenced through its own [`UrlTransfer`] implementation.
pub struct MemoryBackend {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryBackend {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Key addressed by a URL this backend issued
    fn key_from_url<'a>(&self, url: &'a str) -> StoreResult<&'a str> {
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| StoreError::unknown(anyhow!("not a memory URL: {}", url)))?;
        let (bucket, path) = rest
            .split_once('/')
            .ok_or_else(|| StoreError::unknown(anyhow!("memory URL has no key: {}", url)))?;
        if bucket != self.bucket {
            return Err(StoreError::new(
                ErrorKind::NotFound,
                anyhow!("no such bucket: {}", bucket),
            ));
        }
        Ok(path.split('?').next().unwrap_or(path))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<()> {
        let object = StoredObject {
            data,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectMetadata> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| ObjectMetadata {
                content_type: Some(object.content_type.clone()),
                size: object.data.len() as u64,
                etag: None,
                last_modified: Some(object.last_modified),
            })
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        // Like S3, deleting a missing key succeeds
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn presign_put(&self, key: &str, _content_type: &str, expires_in: Duration) -> StoreResult<String> {
        Ok(format!(
            "{}?X-Amz-Expires={}",
            self.object_url(key),
            expires_in.as_secs()
        ))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        Ok(format!(
            "{}?X-Amz-Expires={}",
            self.object_url(key),
            expires_in.as_secs()
        ))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}{}/{}", SCHEME, self.bucket, key)
    }

    async fn head_bucket(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UrlTransfer for MemoryBackend {
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> StoreResult<()> {
        let key = self.key_from_url(url)?;
        self.put_object(key, data, content_type).await
    }

    async fn get(&self, url: &str) -> StoreResult<Bytes> {
        let key = self.key_from_url(url)?;
        self.get_object(key).await
    }
}
