//! Owner of the single live audio recording process

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use tracing::{error, info, warn};

use super::ports::{AudioBackend, AudioError, AudioProcess, StopOutcome};

/// Starts and stops one audio recording at a time
pub struct AudioController<A: AudioBackend> {
    backend: A,
    grace: StdDuration,
    process: Option<Box<dyn AudioProcess>>,
    output: Option<PathBuf>,
}

impl<A: AudioBackend> AudioController<A> {
    /// `grace` bounds how long a stop waits before killing the process
    pub fn new(backend: A, grace: StdDuration) -> Self {
        Self {
            backend,
            grace,
            process: None,
            output: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    /// File the running process is writing to
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Launch a recording into `output`
    pub async fn start(&mut self, output: &Path) -> Result<(), AudioError> {
        if self.process.is_some() {
            return Err(AudioError::StartFailed(
                "a recording is already running".to_string(),
            ));
        }

        let process = self.backend.launch(output).await?;
        info!(pid = ?process.id(), file = %output.display(), "Audio recording started");

        self.process = Some(process);
        self.output = Some(output.to_path_buf());
        Ok(())
    }

    /// Stop the running recording, if any.
    ///
    /// Returns `None` when nothing was running or the stop itself failed.
    /// The process handle is released either way.
    pub async fn stop(&mut self) -> Option<StopOutcome> {
        let mut process = self.process.take()?;
        let output = self.output.take();

        match process.request_stop(self.grace).await {
            Ok(StopOutcome::Graceful) => {
                info!(file = ?output, "Audio recording stopped");
                Some(StopOutcome::Graceful)
            }
            Ok(StopOutcome::Killed) => {
                warn!(
                    file = ?output,
                    grace_ms = self.grace.as_millis() as u64,
                    "Audio process ignored stop request and was killed"
                );
                Some(StopOutcome::Killed)
            }
            Err(e) => {
                error!(error = %e, "Failed to stop audio recording");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FakeProcess {
        outcome: StopOutcome,
        stops: Arc<AtomicU32>,
    }

    #[async_trait]
    impl AudioProcess for FakeProcess {
        fn id(&self) -> Option<u32> {
            Some(4242)
        }

        async fn request_stop(&mut self, _grace: StdDuration) -> Result<StopOutcome, AudioError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome)
        }
    }

    struct FakeBackend {
        outcome: StopOutcome,
        fail_launch: bool,
        stops: Arc<AtomicU32>,
    }

    impl FakeBackend {
        fn new(outcome: StopOutcome) -> Self {
            Self {
                outcome,
                fail_launch: false,
                stops: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn launch(&self, _output: &Path) -> Result<Box<dyn AudioProcess>, AudioError> {
            if self.fail_launch {
                return Err(AudioError::ToolNotFound("arecord".to_string()));
            }
            Ok(Box::new(FakeProcess {
                outcome: self.outcome,
                stops: Arc::clone(&self.stops),
            }))
        }
    }

    #[tokio::test]
    async fn start_then_stop() {
        let backend = FakeBackend::new(StopOutcome::Graceful);
        let stops = Arc::clone(&backend.stops);
        let mut controller = AudioController::new(backend, StdDuration::from_secs(2));

        controller.start(Path::new("/tmp/a.wav")).await.unwrap();
        assert!(controller.is_running());
        assert_eq!(controller.output(), Some(Path::new("/tmp/a.wav")));

        assert_eq!(controller.stop().await, Some(StopOutcome::Graceful));
        assert!(!controller.is_running());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_start_is_refused() {
        let mut controller =
            AudioController::new(FakeBackend::new(StopOutcome::Graceful), StdDuration::ZERO);
        controller.start(Path::new("/tmp/a.wav")).await.unwrap();

        let err = controller.start(Path::new("/tmp/b.wav")).await.unwrap_err();
        assert!(matches!(err, AudioError::StartFailed(_)));
        assert_eq!(controller.output(), Some(Path::new("/tmp/a.wav")));
    }

    #[tokio::test]
    async fn stop_without_process_is_noop() {
        let backend = FakeBackend::new(StopOutcome::Graceful);
        let stops = Arc::clone(&backend.stops);
        let mut controller = AudioController::new(backend, StdDuration::ZERO);

        assert_eq!(controller.stop().await, None);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn launch_failure_leaves_controller_idle() {
        let mut backend = FakeBackend::new(StopOutcome::Graceful);
        backend.fail_launch = true;
        let mut controller = AudioController::new(backend, StdDuration::ZERO);

        assert!(controller.start(Path::new("/tmp/a.wav")).await.is_err());
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn killed_outcome_is_reported() {
        let mut controller =
            AudioController::new(FakeBackend::new(StopOutcome::Killed), StdDuration::ZERO);
        controller.start(Path::new("/tmp/a.wav")).await.unwrap();

        assert_eq!(controller.stop().await, Some(StopOutcome::Killed));
    }
}
