//! ALSA arecord audio adapter

use std::path::Path;
use std::process::Stdio;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::application::ports::{AudioBackend, AudioError, AudioProcess, StopOutcome};
use crate::domain::config::AudioSettings;

/// Name of the ALSA recording binary
pub const ARECORD: &str = "arecord";

/// Launches `arecord` with the configured device settings
pub struct ArecordBackend {
    program: String,
    settings: AudioSettings,
}

impl ArecordBackend {
    pub fn new(settings: AudioSettings) -> Self {
        Self::with_program(ARECORD, settings)
    }

    /// Use a different binary with the same command line
    pub fn with_program(program: impl Into<String>, settings: AudioSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        vec![
            "-D".to_string(),
            self.settings.device.clone(),
            "-f".to_string(),
            self.settings.format.clone(),
            "-r".to_string(),
            self.settings.sample_rate.to_string(),
            "-c".to_string(),
            self.settings.channels.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl AudioBackend for ArecordBackend {
    async fn launch(&self, output: &Path) -> Result<Box<dyn AudioProcess>, AudioError> {
        let child = Command::new(&self.program)
            .args(self.build_args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AudioError::ToolNotFound(self.program.clone())
                } else {
                    AudioError::StartFailed(e.to_string())
                }
            })?;

        debug!(pid = ?child.id(), device = %self.settings.device, "arecord spawned");
        Ok(Box::new(ArecordProcess { child }))
    }
}

/// A running `arecord` process
pub struct ArecordProcess {
    child: Child,
}

impl ArecordProcess {
    /// Send SIGTERM so arecord finalizes the WAV header
    #[cfg(unix)]
    fn terminate(&self) -> Result<(), AudioError> {
        if let Some(id) = self.child.id() {
            signal::kill(Pid::from_raw(id as i32), Signal::SIGTERM)
                .map_err(|e| AudioError::StopFailed(format!("Signal failed: {}", e)))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&self) -> Result<(), AudioError> {
        Ok(())
    }
}

#[async_trait]
impl AudioProcess for ArecordProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn request_stop(&mut self, grace: StdDuration) -> Result<StopOutcome, AudioError> {
        // Already exited (device vanished, disk full) counts as graceful
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(%status, "arecord had already exited");
            return Ok(StopOutcome::Graceful);
        }

        if let Err(e) = self.terminate() {
            debug!(error = %e, "SIGTERM failed, killing arecord");
        } else if let Ok(waited) = tokio::time::timeout(grace, self.child.wait()).await {
            waited.map_err(|e| AudioError::StopFailed(e.to_string()))?;
            return Ok(StopOutcome::Graceful);
        }

        // kill() also reaps the process
        self.child
            .kill()
            .await
            .map_err(|e| AudioError::StopFailed(e.to_string()))?;
        Ok(StopOutcome::Killed)
    }
}
