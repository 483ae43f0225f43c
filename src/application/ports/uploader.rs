//! Upload port interface

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Upload errors
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File too large: {size_mb:.2}MB (max: {max_mb:.2}MB)")]
    TooLarge { size_mb: f64, max_mb: f64 },

    #[error("Insufficient memory: {free_mb}MB free (need {required_mb}MB+)")]
    InsufficientMemory { free_mb: u64, required_mb: u64 },

    #[error("Could not connect to server: {0}")]
    Connect(String),

    #[error("Upload timed out ({0} seconds)")]
    Timeout(u64),

    #[error("{0}")]
    Rejected(String),

    #[error("Upload error: {0}")]
    Request(String),

    #[error("Failed to parse server response: {0}")]
    ParseError(String),
}

/// What the server said about a successful upload
#[derive(Debug, Clone, PartialEq)]
pub enum ServerResponse {
    Json(Value),
    Text(String),
}

impl ServerResponse {
    /// Look up a string-ish field of a JSON response
    pub fn field(&self, key: &str) -> Option<String> {
        match self {
            Self::Json(value) => value.get(key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            Self::Text(_) => None,
        }
    }
}

/// Successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub size_bytes: u64,
    pub response: ServerResponse,
}

/// Port for transferring one file to the remote server
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Make exactly one upload attempt for `path`.
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, UploadError>;
}
