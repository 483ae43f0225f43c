//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::config::{AppConfig, UploadConfig};

/// Capture Pin - button-triggered photo and audio capture
#[derive(Parser, Debug)]
#[command(name = "capture-pin")]
#[command(version)]
#[command(about = "Button-triggered photo and audio capture with upload for Raspberry Pi")]
#[command(long_about = None)]
pub struct Cli {
    /// BCM pin number of the record button
    #[arg(long, value_name = "PIN")]
    pub button_pin: Option<u8>,

    /// Use the Enter key instead of a GPIO button
    #[arg(long)]
    pub keyboard: bool,

    /// Directory for captured photos
    #[arg(long, value_name = "DIR")]
    pub photo_dir: Option<String>,

    /// Directory for audio recordings
    #[arg(long, value_name = "DIR")]
    pub recordings_dir: Option<String>,

    /// Photo resolution (e.g., 1920x1080)
    #[arg(short = 'r', long, value_name = "WxH")]
    pub resolution: Option<String>,

    /// Time between photos (e.g., 2s, 1.5s, 500ms)
    #[arg(short = 'i', long, value_name = "TIME")]
    pub interval: Option<String>,

    /// Keep files on the device instead of uploading them
    #[arg(long)]
    pub no_upload: bool,

    /// Upload server URL
    #[arg(long, value_name = "URL")]
    pub upload_url: Option<String>,

    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config layer holding only the values given on the command line
    pub fn to_config(&self) -> AppConfig {
        let upload = if self.no_upload || self.upload_url.is_some() {
            Some(UploadConfig {
                enabled: self.no_upload.then_some(false),
                url: self.upload_url.clone(),
                ..Default::default()
            })
        } else {
            None
        };

        AppConfig {
            button_pin: self.button_pin,
            photo_dir: self.photo_dir.clone(),
            recordings_dir: self.recordings_dir.clone(),
            resolution: self.resolution.clone(),
            photo_interval: self.interval.clone(),
            upload,
            ..Default::default()
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check that the camera, audio and GPIO tools are installed
    Doctor,
    /// Take a single photo now
    Snap,
    /// Upload one file to the server
    Upload {
        /// File to upload
        file: PathBuf,
        /// Server URL (overrides config)
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },
    /// Manage files stored on the server
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Remote file actions
#[derive(Subcommand, Debug)]
pub enum RemoteAction {
    /// List files on the server
    List {
        /// Server URL (overrides config)
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },
    /// Delete a file from the server
    Delete {
        /// Stored file name
        name: String,
        /// Server URL (overrides config)
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "button_pin",
    "photo_dir",
    "recordings_dir",
    "resolution",
    "image_format",
    "quality",
    "photo_interval",
    "audio.device",
    "audio.sample_rate",
    "audio.channels",
    "audio.format",
    "upload.enabled",
    "upload.url",
    "upload.max_size_mb",
    "upload.timeout",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["capture-pin"]);
        assert!(cli.button_pin.is_none());
        assert!(!cli.keyboard);
        assert!(!cli.no_upload);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.to_config(), AppConfig::empty());
    }

    #[test]
    fn cli_parses_capture_flags() {
        let cli = Cli::parse_from([
            "capture-pin",
            "--button-pin",
            "17",
            "-r",
            "1280x720",
            "-i",
            "1.5s",
            "--photo-dir",
            "/data/photos",
        ]);
        let config = cli.to_config();
        assert_eq!(config.button_pin, Some(17));
        assert_eq!(config.resolution, Some("1280x720".to_string()));
        assert_eq!(config.photo_interval, Some("1.5s".to_string()));
        assert_eq!(config.photo_dir, Some("/data/photos".to_string()));
        assert!(config.upload.is_none());
    }

    #[test]
    fn no_upload_disables_upload() {
        let cli = Cli::parse_from(["capture-pin", "--no-upload"]);
        let upload = cli.to_config().upload.unwrap();
        assert_eq!(upload.enabled, Some(false));
        assert_eq!(upload.url, None);
    }

    #[test]
    fn upload_url_leaves_enabled_unset() {
        let cli = Cli::parse_from(["capture-pin", "--upload-url", "https://media.example.com"]);
        let upload = cli.to_config().upload.unwrap();
        assert_eq!(upload.enabled, None);
        assert_eq!(upload.url, Some("https://media.example.com".to_string()));
    }

    #[test]
    fn cli_parses_upload_command() {
        let cli = Cli::parse_from(["capture-pin", "upload", "a.wav", "--server", "http://pi:5001"]);
        match cli.command {
            Some(Commands::Upload { file, server }) => {
                assert_eq!(file, PathBuf::from("a.wav"));
                assert_eq!(server, Some("http://pi:5001".to_string()));
            }
            other => panic!("Expected Upload command, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_remote_delete() {
        let cli = Cli::parse_from(["capture-pin", "remote", "delete", "old.jpg"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Remote {
                action: RemoteAction::Delete { ref name, server: None }
            }) if name == "old.jpg"
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["capture-pin", "config", "set", "upload.url", "http://x"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "upload.url");
            assert_eq!(value, "http://x");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["capture-pin", "doctor", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Doctor)));
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("button_pin"));
        assert!(is_valid_config_key("audio.device"));
        assert!(is_valid_config_key("upload.max_size_mb"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
