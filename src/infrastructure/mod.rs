//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with rpicam-still, arecord, GPIO sysfs and the upload server.

pub mod audio;
pub mod button;
pub mod capture;
pub mod config;
pub mod tools;
pub mod upload;

// Re-export adapters
pub use audio::ArecordBackend;
pub use button::{KeyboardButton, SysfsButton};
pub use capture::RpicamCapture;
pub use config::XdgConfigStore;
pub use tools::{check_dependencies, DependencyReport, ToolCheck};
pub use upload::{HttpUploader, RemoteFile};
