//! Resolved settings handed to the session and its backends

use std::path::PathBuf;

use crate::domain::recording::{Duration, ImageFormat, Resolution};

/// Bytes in one megabyte, as used for upload limits
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Still-capture settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub resolution: Resolution,
    pub format: ImageFormat,
    /// JPEG quality 1-100
    pub quality: u8,
    /// Hard limit for one capture before it counts as failed
    pub timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            format: ImageFormat::default(),
            quality: 85,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Audio capture settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    /// ALSA device selector
    pub device: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// ALSA sample format, e.g. S32_LE
    pub format: String,
    /// How long a graceful stop may take before the process is killed
    pub stop_grace: Duration,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            device: "hw:0,0".to_string(),
            sample_rate: 48_000,
            channels: 2,
            format: "S32_LE".to_string(),
            stop_grace: Duration::from_secs(2),
        }
    }
}

/// Upload settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub enabled: bool,
    pub server_url: String,
    pub max_file_size: u64,
    pub timeout: Duration,
    /// Refuse to upload when the device is low on memory
    pub check_memory: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            server_url: "http://localhost:5001".to_string(),
            max_file_size: 20 * BYTES_PER_MB,
            timeout: Duration::default_upload_timeout(),
            check_memory: true,
        }
    }
}

/// Everything a recording session needs, resolved from [`super::AppConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// BCM number of the record button
    pub button_pin: u8,
    pub photo_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub photo_interval: Duration,
    /// Upper bound for joining the photo poller on stop
    pub poller_join_timeout: Duration,
    pub capture: CaptureSettings,
    pub audio: AudioSettings,
    pub upload: UploadSettings,
}

impl SessionConfig {
    /// Config rooted in explicit directories with default settings otherwise
    pub fn with_dirs(photo_dir: impl Into<PathBuf>, recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            button_pin: 4,
            photo_dir: photo_dir.into(),
            recordings_dir: recordings_dir.into(),
            photo_interval: Duration::default_photo_interval(),
            poller_join_timeout: Duration::from_secs(3),
            capture: CaptureSettings::default(),
            audio: AudioSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}
