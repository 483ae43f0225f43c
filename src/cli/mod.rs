//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the record loop and the auxiliary command handlers.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod device_cmd;
pub mod presenter;
pub mod remote_cmd;
pub mod signals;

// Re-export commonly used types
pub use app::{run_recorder, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, RemoteAction};
pub use presenter::Presenter;
