//! Still-capture port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture tool not found: {0}")]
    ToolNotFound(String),

    #[error("Capture timed out after {0}s")]
    Timeout(u64),

    #[error("Capture failed: {0}")]
    Failed(String),

    #[error("Capture produced no data at {0}")]
    EmptyOutput(String),
}

/// Port for capturing a single still image
#[async_trait]
pub trait PhotoCapture: Send + Sync {
    /// Capture one photo into `output`.
    ///
    /// Returns once the file is written or the attempt has failed; must not
    /// run longer than the adapter's bounded timeout.
    async fn capture(&self, output: &Path) -> Result<(), CaptureError>;
}
