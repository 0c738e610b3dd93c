//! Shared utilities for the document services

// Re-export common dependencies
pub use serde;
pub use serde_json;
pub use tracing;

pub mod observability;
pub mod response;

pub use response::ApiResponse;
