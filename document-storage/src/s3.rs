/// S3-compatible object storage backend
///
/// Works against AWS S3 or compatible services (MinIO, DigitalOcean Spaces,
/// etc.) through `aws-sdk-s3`. The client is built once from
/// [`StorageConfig`] and owned by the backend; nothing here is global.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::ObjectBackend;
use crate::config::StorageConfig;
use crate::error::{ErrorKind, StoreError, StoreResult};
use crate::types::ObjectMetadata;

pub struct S3Backend {
    client: Client,
    bucket: String,
    endpoint: String,
    path_style: bool,
}

impl S3Backend {
    /// Create from an existing SDK client
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            path_style: config.path_style,
        }
    }

    /// Build the SDK client from static credentials and a custom endpoint
    pub async fn from_config(config: &StorageConfig) -> Self {
        info!(
            endpoint = %config.endpoint,
            bucket = %config.bucket,
            path_style = config.path_style,
            "Initializing S3 client"
        );

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "document-storage",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        Self::new(Client::from_conf(s3_config), config)
    }

    /// Create the bucket unless it already exists (call on startup)
    pub async fn ensure_bucket(&self) -> StoreResult<()> {
        if self.head_bucket().await.is_ok() {
            return Ok(());
        }

        warn!(bucket = %self.bucket, "Bucket not reachable, attempting to create it");
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(classify)?;

        info!(bucket = %self.bucket, "Bucket created");
        Ok(())
    }
}

/// Map an SDK failure onto the gateway's error kinds
fn classify<E>(err: SdkError<E>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let kind = match &err {
        SdkError::ServiceError(e) => ErrorKind::from_status(e.raw().status().as_u16()),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorKind::Transport
        }
        _ => ErrorKind::Unknown,
    };
    StoreError::new(kind, err)
}

fn presigning_config(expires_in: Duration) -> StoreResult<PresigningConfig> {
    PresigningConfig::expires_in(expires_in).map_err(StoreError::unknown)
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<()> {
        debug!(key, size = data.len(), content_type, "S3 PUT");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(data.len() as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<Bytes> {
        debug!(key, "S3 GET");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        let size_hint = response.content_length().unwrap_or_default().max(0) as usize;
        let mut body = response.body;
        let mut buffer = BytesMut::with_capacity(size_hint);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(StoreError::transport)?;
            buffer.extend_from_slice(&chunk);
        }

        debug!(key, size = buffer.len(), "S3 GET complete");
        Ok(buffer.freeze())
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectMetadata> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(ObjectMetadata {
            content_type: response.content_type().map(str::to_string),
            size: response.content_length().unwrap_or_default().max(0) as u64,
            etag: response.e_tag().map(|s| s.trim_matches('"').to_string()),
            last_modified: response.last_modified().and_then(to_chrono),
        })
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        debug!(key, "S3 DELETE");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn presign_put(&self, key: &str, content_type: &str, expires_in: Duration) -> StoreResult<String> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning_config(expires_in)?)
            .await
            .map_err(classify)?;

        Ok(request.uri().to_string())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config(expires_in)?)
            .await
            .map_err(classify)?;

        Ok(request.uri().to_string())
    }

    fn object_url(&self, key: &str) -> String {
        if self.path_style {
            return format!("{}/{}/{}", self.endpoint, self.bucket, key);
        }

        match Url::parse(&self.endpoint) {
            Ok(endpoint) => match endpoint.host_str() {
                Some(host) => {
                    let port = endpoint.port().map(|p| format!(":{}", p)).unwrap_or_default();
                    format!("{}://{}.{}{}/{}", endpoint.scheme(), self.bucket, host, port, key)
                }
                None => format!("{}/{}/{}", self.endpoint, self.bucket, key),
            },
            Err(_) => format!("{}/{}/{}", self.endpoint, self.bucket, key),
        }
    }

    async fn head_bucket(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }
}
