//! Document storage gateway
//!
//! Turns create/read/delete/inspect intents into requests against one
//! bucket. Every operation is a single independent round trip (two for
//! reads and presigned uploads); nothing is cached and nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::ObjectBackend;
use crate::config::{StorageConfig, TransferMode};
use crate::error::{DocumentError, DocumentResult, ErrorKind, Operation, StoreError};
use crate::transfer::UrlTransfer;
use crate::types::{Document, DocumentId, DocumentMetadata, NewDocument, UploadDescriptor};

pub struct DocumentGateway {
    backend: Arc<dyn ObjectBackend>,
    transfer: Arc<dyn UrlTransfer>,
    config: StorageConfig,
}

impl DocumentGateway {
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        transfer: Arc<dyn UrlTransfer>,
        config: StorageConfig,
    ) -> Self {
        info!(
            bucket = %config.bucket,
            mode = config.transfer_mode.as_str(),
            "Document gateway ready"
        );
        Self {
            backend,
            transfer,
            config,
        }
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.config.transfer_mode
    }

    pub fn default_url_expiry(&self) -> Duration {
        self.config.url_expiry()
    }

    fn key(&self, doc_id: &DocumentId) -> String {
        self.config.object_key(&doc_id.to_string())
    }

    /// Log the store failure and wrap it for the caller
    fn fail(&self, operation: Operation, doc_id: &DocumentId, err: StoreError) -> DocumentError {
        error!(
            doc_id = %doc_id,
            kind = %err.kind,
            error = %err.source,
            "Failed to {} document",
            operation
        );
        DocumentError::new(operation, err)
    }

    /// Store a new document under a freshly generated id
    ///
    /// In direct mode the bytes go straight to the store and `url` is the
    /// plain object URL. In presigned mode a signed PUT URL is issued, the
    /// bytes are sent to it, and that URL is returned.
    pub async fn create_document(&self, file: NewDocument) -> DocumentResult<UploadDescriptor> {
        let doc_id = DocumentId::generate();
        let key = self.key(&doc_id);
        let size = file.data.len();

        debug!(
            doc_id = %doc_id,
            size,
            content_type = %file.content_type,
            file_name = file.file_name.as_deref().unwrap_or("-"),
            "Creating document"
        );

        let url = match self.config.transfer_mode {
            TransferMode::Direct => {
                self.backend
                    .put_object(&key, file.data, &file.content_type)
                    .await
                    .map_err(|e| self.fail(Operation::Create, &doc_id, e))?;
                self.backend.object_url(&key)
            }
            TransferMode::Presigned => {
                let url = self
                    .backend
                    .presign_put(&key, &file.content_type, self.config.url_expiry())
                    .await
                    .map_err(|e| self.fail(Operation::Create, &doc_id, e))?;
                self.transfer
                    .put(&url, file.data, &file.content_type)
                    .await
                    .map_err(|e| self.fail(Operation::Create, &doc_id, e))?;
                url
            }
        };

        info!(doc_id = %doc_id, size, "Document created");
        Ok(UploadDescriptor { doc_id, url })
    }

    /// URL for the document, valid for the configured default expiry
    pub async fn document_url(&self, doc_id: &DocumentId) -> DocumentResult<String> {
        self.document_url_with_expiry(doc_id, self.config.url_expiry()).await
    }

    /// URL for the document. Does not check that the document exists.
    ///
    /// Direct mode ignores `expires_in`: the object URL does not expire.
    pub async fn document_url_with_expiry(
        &self,
        doc_id: &DocumentId,
        expires_in: Duration,
    ) -> DocumentResult<String> {
        let key = self.key(doc_id);
        match self.config.transfer_mode {
            TransferMode::Direct => Ok(self.backend.object_url(&key)),
            TransferMode::Presigned => self
                .backend
                .presign_get(&key, expires_in)
                .await
                .map_err(|e| self.fail(Operation::IssueUrl, doc_id, e)),
        }
    }

    /// Fetch the full content and its content type
    pub async fn read_document(&self, doc_id: &DocumentId) -> DocumentResult<Document> {
        let key = self.key(doc_id);

        let metadata: DocumentMetadata = self
            .backend
            .head_object(&key)
            .await
            .map_err(|e| self.fail(Operation::Read, doc_id, e))?
            .into();

        let data = match self.config.transfer_mode {
            TransferMode::Direct => self.backend.get_object(&key).await,
            TransferMode::Presigned => {
                match self
                    .backend
                    .presign_get(&key, self.config.read_url_expiry())
                    .await
                {
                    Ok(url) => self.transfer.get(&url).await,
                    Err(e) => Err(e),
                }
            }
        }
        .map_err(|e| self.fail(Operation::Read, doc_id, e))?;

        debug!(doc_id = %doc_id, size = data.len(), "Document read");
        Ok(Document {
            data,
            content_type: metadata.content_type,
        })
    }

    /// Remove the document. No existence check is made first.
    pub async fn delete_document(&self, doc_id: &DocumentId) -> DocumentResult<()> {
        self.backend
            .delete_object(&self.key(doc_id))
            .await
            .map_err(|e| self.fail(Operation::Delete, doc_id, e))?;

        info!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    /// Stored size and content type, without fetching content
    pub async fn document_metadata(&self, doc_id: &DocumentId) -> DocumentResult<DocumentMetadata> {
        self.backend
            .head_object(&self.key(doc_id))
            .await
            .map(DocumentMetadata::from)
            .map_err(|e| self.fail(Operation::Metadata, doc_id, e))
    }

    /// `true` if a metadata lookup succeeds
    ///
    /// Any failure reads as absence, including outages and credential
    /// problems. Use [`try_document_exists`](Self::try_document_exists)
    /// to tell them apart.
    pub async fn document_exists(&self, doc_id: &DocumentId) -> bool {
        match self.backend.head_object(&self.key(doc_id)).await {
            Ok(_) => true,
            Err(e) if e.kind == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    doc_id = %doc_id,
                    kind = %e.kind,
                    error = %e.source,
                    "Existence check failed, reporting document as absent"
                );
                false
            }
        }
    }

    /// Like [`document_exists`](Self::document_exists) but only a
    /// not-found answer maps to `false`; other failures are returned.
    pub async fn try_document_exists(&self, doc_id: &DocumentId) -> DocumentResult<bool> {
        match self.backend.head_object(&self.key(doc_id)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.fail(Operation::Exists, doc_id, e)),
        }
    }

    /// Whether the configured bucket is reachable
    pub async fn health_check(&self) -> bool {
        match self.backend.head_bucket().await {
            Ok(()) => true,
            Err(e) => {
                warn!(bucket = %self.config.bucket, kind = %e.kind, error = %e.source, "Storage health check failed");
                false
            }
        }
    }
}
