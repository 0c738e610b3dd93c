//! Object store backend trait

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;
use crate::types::ObjectMetadata;

/// One bucket of an S3-compatible object store
///
/// Every method is a single request against the store. Keys are full
/// object keys; the gateway owns the id-to-key mapping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Store `data` under `key` with the given content type
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<()>;

    /// Fetch the whole object into one buffer
    async fn get_object(&self, key: &str) -> StoreResult<Bytes>;

    /// Fetch stored size and content type without the body
    async fn head_object(&self, key: &str) -> StoreResult<ObjectMetadata>;

    /// Remove the object. Whether a missing key is an error is up to the store.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;

    /// Signed URL accepting a PUT with exactly this content type
    async fn presign_put(&self, key: &str, content_type: &str, expires_in: Duration) -> StoreResult<String>;

    /// Signed URL for a GET of the object
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<String>;

    /// Unsigned, non-expiring URL of the object
    fn object_url(&self, key: &str) -> String;

    /// Check that the bucket is reachable with the configured credentials
    async fn head_bucket(&self) -> StoreResult<()>;
}
