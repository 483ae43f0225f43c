//! rpicam-still capture adapter

use std::path::Path;
use std::process::Stdio;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{CaptureError, PhotoCapture};
use crate::domain::config::CaptureSettings;
use crate::domain::recording::ImageFormat;

/// Name of the Raspberry Pi still-capture binary
pub const RPICAM_STILL: &str = "rpicam-still";

/// Camera warm-up passed to `--timeout`, in milliseconds
const WARMUP_MS: u64 = 1000;

/// Captures stills by running `rpicam-still` once per photo
pub struct RpicamCapture {
    program: String,
    settings: CaptureSettings,
}

impl RpicamCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self::with_program(RPICAM_STILL, settings)
    }

    /// Use a different binary with the same command line
    pub fn with_program(program: impl Into<String>, settings: CaptureSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            "--width".to_string(),
            self.settings.resolution.width().to_string(),
            "--height".to_string(),
            self.settings.resolution.height().to_string(),
            "--quality".to_string(),
            self.settings.quality.to_string(),
            "--timeout".to_string(),
            WARMUP_MS.to_string(),
            "--nopreview".to_string(),
        ];

        if self.settings.format != ImageFormat::Jpeg {
            args.push("--encoding".to_string());
            args.push(self.settings.format.encoding().to_string());
        }

        args
    }

    fn limit(&self) -> StdDuration {
        self.settings.timeout.as_std()
    }
}

#[async_trait]
impl PhotoCapture for RpicamCapture {
    async fn capture(&self, output: &Path) -> Result<(), CaptureError> {
        let child = Command::new(&self.program)
            .args(self.build_args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::ToolNotFound(self.program.clone())
                } else {
                    CaptureError::Failed(e.to_string())
                }
            })?;

        // Dropping the wait future on timeout kills the child
        let output_result = tokio::time::timeout(self.limit(), child.wait_with_output())
            .await
            .map_err(|_| CaptureError::Timeout(self.settings.timeout.as_secs()))?
            .map_err(|e| CaptureError::Failed(e.to_string()))?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("exited with non-zero status");
            return Err(CaptureError::Failed(format!("{}: {}", self.program, reason.trim())));
        }

        debug!(file = %output.display(), "rpicam-still finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::Resolution;
    use tempfile::TempDir;

    #[test]
    fn jpeg_args() {
        let capture = RpicamCapture::new(CaptureSettings::default());
        let args = capture.build_args(Path::new("/home/pi/pictures/p.jpg"));

        assert_eq!(
            args,
            vec![
                "-o",
                "/home/pi/pictures/p.jpg",
                "--width",
                "1920",
                "--height",
                "1080",
                "--quality",
                "85",
                "--timeout",
                "1000",
                "--nopreview",
            ]
        );
    }

    #[test]
    fn png_args_select_encoding() {
        let settings = CaptureSettings {
            resolution: Resolution::new(640, 480),
            format: ImageFormat::Png,
            ..Default::default()
        };
        let args = RpicamCapture::new(settings).build_args(Path::new("p.png"));

        assert!(args.windows(2).any(|w| w == ["--width", "640"]));
        assert!(args.ends_with(&["--encoding".to_string(), "png".to_string()]));
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let dir = TempDir::new().unwrap();
        let capture =
            RpicamCapture::with_program("rpicam-still-does-not-exist", CaptureSettings::default());

        let err = capture.capture(&dir.path().join("p.jpg")).await.unwrap_err();
        assert!(matches!(err, CaptureError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_binary_is_failed() {
        let dir = TempDir::new().unwrap();
        let capture = RpicamCapture::with_program("false", CaptureSettings::default());

        let err = capture.capture(&dir.path().join("p.jpg")).await.unwrap_err();
        assert!(matches!(err, CaptureError::Failed(_)));
    }
}
