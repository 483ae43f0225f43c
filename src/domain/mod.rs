//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use config::{AppConfig, SessionConfig};
pub use error::*;
pub use recording::{Duration, ImageFormat, Resolution};
pub use session::{SessionId, SessionLifecycle, SessionState};
