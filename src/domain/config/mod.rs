//! Configuration value objects

mod app_config;
mod settings;

pub use app_config::{expand_home, validate_quality, validate_url, AppConfig, AudioConfig, UploadConfig};
pub use settings::{
    AudioSettings, CaptureSettings, SessionConfig, UploadSettings, BYTES_PER_MB,
};
