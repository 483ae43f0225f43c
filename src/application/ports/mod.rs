//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio;
pub mod button;
pub mod capture;
pub mod config;
pub mod uploader;

// Re-export common types
pub use audio::{AudioBackend, AudioError, AudioProcess, StopOutcome};
pub use button::{ButtonError, ButtonEvents};
pub use capture::{CaptureError, PhotoCapture};
pub use config::ConfigStore;
pub use uploader::{ServerResponse, UploadError, UploadReceipt, Uploader};
