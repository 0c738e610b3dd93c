//! Document types shared by the gateway and its callers

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content type recorded when neither the caller nor the store supplies one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Identifier of a stored document
///
/// Always a freshly generated UUID v4, never derived from content, so two
/// uploads of the same bytes get distinct identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// File handed to `create_document`
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub data: Bytes,
    /// Declared MIME type, stored as-is
    pub content_type: String,
    /// Original filename, only used for logging
    pub file_name: Option<String>,
}

impl NewDocument {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Result of `create_document`: the new identifier and an access URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub doc_id: DocumentId,
    pub url: String,
}

/// Content read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub data: Bytes,
    pub content_type: String,
}

/// Stored attributes of a document, without its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub content_type: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Raw HEAD result as reported by a backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub size: u64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<ObjectMetadata> for DocumentMetadata {
    fn from(meta: ObjectMetadata) -> Self {
        Self {
            content_type: meta
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: meta.size,
            etag: meta.etag,
            last_modified: meta.last_modified,
        }
    }
}
