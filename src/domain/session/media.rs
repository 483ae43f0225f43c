//! Naming and sizing of captured media files

use std::fmt;
use std::path::{Path, PathBuf};

use super::SessionId;
use crate::domain::recording::ImageFormat;

/// Kind of artifact produced by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Photo,
}

impl MediaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Photo => "photo",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `{session_id}_photo_{counter:04}.{ext}`
pub fn photo_file_name(session_id: &SessionId, counter: u32, format: ImageFormat) -> String {
    format!("{}_photo_{:04}.{}", session_id, counter, format.extension())
}

/// `{session_id}.wav`
pub fn audio_file_name(session_id: &SessionId) -> String {
    format!("{}.wav", session_id)
}

/// Full path of the audio file for a session
pub fn audio_file_path(recordings_dir: &Path, session_id: &SessionId) -> PathBuf {
    recordings_dir.join(audio_file_name(session_id))
}

/// Human-readable size (B, KB, MB)
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// File name component for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
