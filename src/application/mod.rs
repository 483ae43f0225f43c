//! Application layer - Use cases and port interfaces
//!
//! Contains the core recording and upload operations and trait definitions
//! for external system interactions.

pub mod audio_controller;
pub mod poller;
pub mod ports;
pub mod session;
pub mod upload;

// Re-export use cases
pub use audio_controller::AudioController;
pub use poller::{PhotoLedger, PhotoPoller, PollerExit, PollerHandle};
pub use session::{CompletedSession, RecordingSession, SessionError, SessionStarted};
pub use upload::{
    FileOutcome, FileReport, UploadBatch, UploadCallbacks, UploadCandidate, UploadSummary,
};
