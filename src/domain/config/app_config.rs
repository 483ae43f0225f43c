//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::{
    AudioSettings, CaptureSettings, SessionConfig, UploadSettings, BYTES_PER_MB,
};
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, ImageFormat, Resolution};

const DEFAULT_BUTTON_PIN: u8 = 4;
const DEFAULT_PHOTO_DIR: &str = "~/pictures";
const DEFAULT_RECORDINGS_DIR: &str = "~/recordings";
const DEFAULT_QUALITY: u8 = 85;
const DEFAULT_UPLOAD_URL: &str = "http://localhost:5001";
const DEFAULT_MAX_SIZE_MB: u64 = 20;

/// Audio device section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub format: Option<String>,
}

/// Cloud upload section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub max_size_mb: Option<u64>,
    pub timeout: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub button_pin: Option<u8>,
    pub photo_dir: Option<String>,
    pub recordings_dir: Option<String>,
    pub resolution: Option<String>,
    pub image_format: Option<String>,
    pub quality: Option<u8>,
    pub photo_interval: Option<String>,
    pub audio: Option<AudioConfig>,
    pub upload: Option<UploadConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        let audio = AudioSettings::default();
        Self {
            button_pin: Some(DEFAULT_BUTTON_PIN),
            photo_dir: Some(DEFAULT_PHOTO_DIR.to_string()),
            recordings_dir: Some(DEFAULT_RECORDINGS_DIR.to_string()),
            resolution: Some(Resolution::default().to_string()),
            image_format: Some(ImageFormat::default().to_string()),
            quality: Some(DEFAULT_QUALITY),
            photo_interval: Some(Duration::default_photo_interval().to_string()),
            audio: Some(AudioConfig {
                device: Some(audio.device),
                sample_rate: Some(audio.sample_rate),
                channels: Some(audio.channels),
                format: Some(audio.format),
            }),
            upload: Some(UploadConfig {
                enabled: Some(true),
                url: Some(DEFAULT_UPLOAD_URL.to_string()),
                max_size_mb: Some(DEFAULT_MAX_SIZE_MB),
                timeout: Some(Duration::default_upload_timeout().to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            button_pin: other.button_pin.or(self.button_pin),
            photo_dir: other.photo_dir.or(self.photo_dir),
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            resolution: other.resolution.or(self.resolution),
            image_format: other.image_format.or(self.image_format),
            quality: other.quality.or(self.quality),
            photo_interval: other.photo_interval.or(self.photo_interval),
            audio: Self::merge_audio_config(self.audio, other.audio),
            upload: Self::merge_upload_config(self.upload, other.upload),
        }
    }

    fn merge_audio_config(
        base: Option<AudioConfig>,
        other: Option<AudioConfig>,
    ) -> Option<AudioConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(AudioConfig {
                device: o.device.or(b.device),
                sample_rate: o.sample_rate.or(b.sample_rate),
                channels: o.channels.or(b.channels),
                format: o.format.or(b.format),
            }),
        }
    }

    fn merge_upload_config(
        base: Option<UploadConfig>,
        other: Option<UploadConfig>,
    ) -> Option<UploadConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(UploadConfig {
                enabled: o.enabled.or(b.enabled),
                url: o.url.or(b.url),
                max_size_mb: o.max_size_mb.or(b.max_size_mb),
                timeout: o.timeout.or(b.timeout),
            }),
        }
    }

    /// Resolve into validated session settings.
    ///
    /// Unset values fall back to defaults; set but malformed values are errors.
    pub fn resolve(&self) -> Result<SessionConfig, ConfigError> {
        let photo_dir = expand_home(self.photo_dir.as_deref().unwrap_or(DEFAULT_PHOTO_DIR));
        let recordings_dir = expand_home(
            self.recordings_dir
                .as_deref()
                .unwrap_or(DEFAULT_RECORDINGS_DIR),
        );

        let mut config = SessionConfig::with_dirs(photo_dir, recordings_dir);
        config.button_pin = self.button_pin.unwrap_or(DEFAULT_BUTTON_PIN);

        if let Some(interval) = &self.photo_interval {
            config.photo_interval = parse_field("photo_interval", interval)?;
        }

        config.capture = self.resolve_capture()?;
        config.audio = self.resolve_audio()?;
        config.upload = self.resolve_upload()?;

        Ok(config)
    }

    fn resolve_capture(&self) -> Result<CaptureSettings, ConfigError> {
        let mut capture = CaptureSettings::default();
        if let Some(resolution) = &self.resolution {
            capture.resolution = parse_field("resolution", resolution)?;
        }
        if let Some(format) = &self.image_format {
            capture.format = parse_field("image_format", format)?;
        }
        if let Some(quality) = self.quality {
            capture.quality = validate_quality(quality)?;
        }
        Ok(capture)
    }

    fn resolve_audio(&self) -> Result<AudioSettings, ConfigError> {
        let mut audio = AudioSettings::default();
        let Some(section) = &self.audio else {
            return Ok(audio);
        };

        if let Some(device) = &section.device {
            audio.device = device.clone();
        }
        if let Some(rate) = section.sample_rate {
            if rate == 0 {
                return Err(ConfigError::invalid("audio.sample_rate", "must be positive"));
            }
            audio.sample_rate = rate;
        }
        if let Some(channels) = section.channels {
            if channels == 0 {
                return Err(ConfigError::invalid("audio.channels", "must be positive"));
            }
            audio.channels = channels;
        }
        if let Some(format) = &section.format {
            audio.format = format.clone();
        }
        Ok(audio)
    }

    fn resolve_upload(&self) -> Result<UploadSettings, ConfigError> {
        let mut upload = UploadSettings::default();
        let Some(section) = &self.upload else {
            return Ok(upload);
        };

        if let Some(enabled) = section.enabled {
            upload.enabled = enabled;
        }
        if let Some(url) = &section.url {
            upload.server_url = validate_url(url)?;
        }
        if let Some(mb) = section.max_size_mb {
            if mb == 0 {
                return Err(ConfigError::invalid("upload.max_size_mb", "must be positive"));
            }
            upload.max_file_size = mb
                .checked_mul(BYTES_PER_MB)
                .ok_or_else(|| ConfigError::invalid("upload.max_size_mb", "value is too large"))?;
        }
        if let Some(timeout) = &section.timeout {
            upload.timeout = parse_field("upload.timeout", timeout)?;
        }
        Ok(upload)
    }
}

fn parse_field<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(key, e.to_string()))
}

/// JPEG quality must be within 1..=100
pub fn validate_quality(quality: u8) -> Result<u8, ConfigError> {
    if (1..=100).contains(&quality) {
        Ok(quality)
    } else {
        Err(ConfigError::invalid("quality", "must be between 1 and 100"))
    }
}

/// Upload URL must be http(s)
pub fn validate_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::invalid(
            "upload.url",
            format!("\"{}\" must start with http:// or https://", url),
        ))
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
