//! Audio recording port interfaces

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Audio recording errors
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("Audio tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to start audio recording: {0}")]
    StartFailed(String),

    #[error("Failed to stop audio recording: {0}")]
    StopFailed(String),
}

/// How a recording process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited within the grace period after the stop request
    Graceful,
    /// Had to be killed after the grace period
    Killed,
}

/// A live recording process, exclusively owned by its controller
#[async_trait]
pub trait AudioProcess: Send {
    /// OS process id, when known
    fn id(&self) -> Option<u32>;

    /// Ask the process to finish, wait up to `grace`, then kill it.
    ///
    /// Returns only after the process has exited, so the output file is
    /// closed.
    async fn request_stop(&mut self, grace: Duration) -> Result<StopOutcome, AudioError>;
}

/// Port for launching long-running audio recordings
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start recording into `output` without waiting for it to finish
    async fn launch(&self, output: &Path) -> Result<Box<dyn AudioProcess>, AudioError>;
}
