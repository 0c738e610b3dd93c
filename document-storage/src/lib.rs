//! document-storage: course document storage on S3-compatible object stores
//!
//! One [`DocumentGateway`] per process, built explicitly from a backend, a
//! URL transfer and a [`StorageConfig`], then shared behind an `Arc`.
//!
//! ## Backends
//!
//! | Backend         | Use Case                    |
//! |-----------------|-----------------------------|
//! | `MemoryBackend` | Unit tests, local runs      |
//! | `S3Backend`     | Production (MinIO/S3)       |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use document_storage::{DocumentGateway, MemoryBackend, NewDocument, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryBackend::new("docs"));
//!     let gateway = DocumentGateway::new(store.clone(), store, StorageConfig::default());
//!
//!     let upload = gateway
//!         .create_document(NewDocument::new(&b"week 1 notes"[..], "text/plain"))
//!         .await?;
//!     let document = gateway.read_document(&upload.doc_id).await?;
//!     assert_eq!(&document.data[..], b"week 1 notes");
//!
//!     Ok(())
//! }
//! ```

mod backend;
mod error;
mod gateway;
mod memory;
mod s3;
mod transfer;
mod types;

#[cfg(test)]
mod fake_http;

pub mod config;

pub use backend::ObjectBackend;
pub use config::{StorageConfig, TransferMode};
pub use error::{DocumentError, DocumentResult, ErrorKind, Operation, StoreError, StoreResult};
pub use gateway::DocumentGateway;
pub use memory::MemoryBackend;
pub use s3::S3Backend;
pub use transfer::{HttpTransfer, UrlTransfer};
pub use types::{
    Document, DocumentId, DocumentMetadata, NewDocument, ObjectMetadata, UploadDescriptor,
    DEFAULT_CONTENT_TYPE,
};
