//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{
    validate_quality, validate_url, AppConfig, AudioConfig, UploadConfig, BYTES_PER_MB,
};
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, ImageFormat, Resolution};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Highest BCM GPIO number on the 40-pin header
const MAX_BCM_PIN: u8 = 27;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key).unwrap_or_else(|| "(not set)".to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

/// Validate `value` for `key` and store it in `config`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "button_pin" => config.button_pin = Some(parse_pin(value)?),
        "photo_dir" => config.photo_dir = Some(non_empty(key, value)?),
        "recordings_dir" => config.recordings_dir = Some(non_empty(key, value)?),
        "resolution" => {
            parse_as::<Resolution>(key, value)?;
            config.resolution = Some(value.to_string());
        }
        "image_format" => {
            let format = parse_as::<ImageFormat>(key, value)?;
            config.image_format = Some(format.to_string());
        }
        "quality" => {
            let quality = parse_as::<u8>(key, value)?;
            config.quality = Some(validate_quality(quality)?);
        }
        "photo_interval" => {
            parse_as::<Duration>(key, value)?;
            config.photo_interval = Some(value.to_string());
        }
        "audio.device" => audio_section(config).device = Some(non_empty(key, value)?),
        "audio.sample_rate" => audio_section(config).sample_rate = Some(positive(key, value)?),
        "audio.channels" => audio_section(config).channels = Some(positive(key, value)?),
        "audio.format" => audio_section(config).format = Some(non_empty(key, value)?),
        "upload.enabled" => upload_section(config).enabled = Some(parse_bool(key, value)?),
        "upload.url" => upload_section(config).url = Some(validate_url(value)?),
        "upload.max_size_mb" => {
            let mb: u64 = positive(key, value)?;
            if mb.checked_mul(BYTES_PER_MB).is_none() {
                return Err(ConfigError::invalid(key, "value is too large"));
            }
            upload_section(config).max_size_mb = Some(mb);
        }
        "upload.timeout" => {
            parse_as::<Duration>(key, value)?;
            upload_section(config).timeout = Some(value.to_string());
        }
        _ => return ensure_known_key(key),
    }
    Ok(())
}

/// Stored value for `key`, formatted for display
fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let audio = config.audio.as_ref();
    let upload = config.upload.as_ref();

    match key {
        "button_pin" => config.button_pin.map(|p| p.to_string()),
        "photo_dir" => config.photo_dir.clone(),
        "recordings_dir" => config.recordings_dir.clone(),
        "resolution" => config.resolution.clone(),
        "image_format" => config.image_format.clone(),
        "quality" => config.quality.map(|q| q.to_string()),
        "photo_interval" => config.photo_interval.clone(),
        "audio.device" => audio.and_then(|a| a.device.clone()),
        "audio.sample_rate" => audio.and_then(|a| a.sample_rate).map(|r| r.to_string()),
        "audio.channels" => audio.and_then(|a| a.channels).map(|c| c.to_string()),
        "audio.format" => audio.and_then(|a| a.format.clone()),
        "upload.enabled" => upload.and_then(|u| u.enabled).map(|b| b.to_string()),
        "upload.url" => upload.and_then(|u| u.url.clone()),
        "upload.max_size_mb" => upload.and_then(|u| u.max_size_mb).map(|m| m.to_string()),
        "upload.timeout" => upload.and_then(|u| u.timeout.clone()),
        _ => None,
    }
}

fn audio_section(config: &mut AppConfig) -> &mut AudioConfig {
    config.audio.get_or_insert_with(AudioConfig::default)
}

fn upload_section(config: &mut AppConfig) -> &mut UploadConfig {
    config.upload.get_or_insert_with(UploadConfig::default)
}

fn parse_as<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(key, e.to_string()))
}

fn parse_pin(value: &str) -> Result<u8, ConfigError> {
    match value.parse::<u8>() {
        Ok(pin) if pin <= MAX_BCM_PIN => Ok(pin),
        _ => Err(ConfigError::invalid(
            "button_pin",
            format!("Must be a BCM pin number between 0 and {}", MAX_BCM_PIN),
        )),
    }
}

fn positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::invalid(key, "Value must be a positive number")),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ConfigError::invalid(key, "Value must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(key, "Value must be 'true' or 'false'")),
    }
}
