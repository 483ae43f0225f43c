//! Recording session entities and value objects

mod media;
mod session_id;
mod state;

pub use media::{
    audio_file_name, audio_file_path, display_name, human_readable_size, photo_file_name,
    MediaKind,
};
pub use session_id::SessionId;
pub use state::{InvalidStateTransition, SessionLifecycle, SessionState};
