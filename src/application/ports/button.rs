//! Button port interface

use async_trait::async_trait;
use thiserror::Error;

/// Button errors
#[derive(Debug, Clone, Error)]
pub enum ButtonError {
    #[error("GPIO interface unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read button: {0}")]
    ReadFailed(String),

    #[error("Button input closed")]
    Closed,
}

/// Port for a single physical push button.
///
/// Neither wait has a timeout; callers that need one must race it themselves.
#[async_trait]
pub trait ButtonEvents: Send {
    /// Wait until the button is pressed (returns at once if already down)
    async fn wait_for_press(&mut self) -> Result<(), ButtonError>;

    /// Wait until the button is released (returns at once if already up)
    async fn wait_for_release(&mut self) -> Result<(), ButtonError>;
}
