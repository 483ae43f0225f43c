//! Main app runner: the button-driven record and upload loop

use std::env;
use std::process::ExitCode;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tracing::{debug, info};

use crate::application::ports::{
    AudioBackend, ButtonError, ButtonEvents, ConfigStore, PhotoCapture, Uploader,
};
use crate::application::{
    CompletedSession, FileOutcome, RecordingSession, SessionError, UploadBatch, UploadCallbacks,
};
use crate::domain::config::{AppConfig, SessionConfig, UploadConfig, UploadSettings};
use crate::domain::session::{display_name, human_readable_size};
use crate::infrastructure::{
    check_dependencies, ArecordBackend, HttpUploader, KeyboardButton, RpicamCapture, SysfsButton,
    XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the upload server URL
pub const UPLOAD_URL_ENV: &str = "CAPTURE_PIN_UPLOAD_URL";

/// Settle time after a press before acting on it
const PRESS_DEBOUNCE: StdDuration = StdDuration::from_millis(200);
/// Pause between finishing one cycle and accepting the next press
const CYCLE_PAUSE: StdDuration = StdDuration::from_millis(500);

/// Errors that end the record loop
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Button failed: {0}")]
    Button(#[from] ButtonError),

    #[error("Session failed: {0}")]
    Session(#[from] SessionError),
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        upload: env::var(UPLOAD_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(|url| UploadConfig {
                url: Some(url),
                ..Default::default()
            }),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Run the recorder until shutdown
pub async fn run_recorder(config: AppConfig, keyboard: bool) -> ExitCode {
    let presenter = Presenter::new();

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let report = check_dependencies(!keyboard).await;
    if !report.all_available() {
        for missing in report.missing() {
            presenter.error(&format!(
                "{} not found. Install with: {}",
                missing.name, missing.install_hint
            ));
        }
        return ExitCode::from(EXIT_ERROR);
    }

    for dir in [&settings.photo_dir, &settings.recordings_dir] {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            presenter.error(&format!("Cannot create {}: {}", dir.display(), e));
            return ExitCode::from(EXIT_ERROR);
        }
    }

    report_upload_status(&presenter, &settings.upload);

    let mut shutdown = match ShutdownSignal::listen() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let session = RecordingSession::new(
        settings.clone(),
        RpicamCapture::new(settings.capture.clone()),
        ArecordBackend::new(settings.audio.clone()),
    );
    let uploads = settings
        .upload
        .enabled
        .then(|| upload_batch(HttpUploader::new(&settings.upload), &settings.upload));

    let result = if keyboard {
        presenter.info("Press Enter to start or stop recording (Ctrl+C to quit)");
        RecorderLoop::new(KeyboardButton::stdin(), session, uploads, presenter)
            .run(&mut shutdown)
            .await
    } else {
        let button = match SysfsButton::open(settings.button_pin).await {
            Ok(button) => button,
            Err(e) => {
                presenter.error(&format!("Cannot open button on GPIO{}: {}", settings.button_pin, e));
                return ExitCode::from(EXIT_ERROR);
            }
        };
        presenter.info(&format!(
            "Press the button on GPIO{} to start or stop recording",
            settings.button_pin
        ));
        RecorderLoop::new(button, session, uploads, presenter)
            .run(&mut shutdown)
            .await
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            Presenter::new().error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Batch uploader sized from the upload settings
pub fn upload_batch<U: Uploader>(uploader: U, settings: &UploadSettings) -> UploadBatch<U> {
    UploadBatch::new(uploader, settings.max_file_size, settings.timeout.as_std())
}

fn report_upload_status(presenter: &Presenter, upload: &UploadSettings) {
    if upload.enabled {
        presenter.info(&format!("Upload enabled: {}", upload.server_url));
    } else {
        presenter.warn("Upload disabled, files stay on this device");
    }
}

/// Drives one session from button presses
pub struct RecorderLoop<B, C, A, U>
where
    B: ButtonEvents,
    C: PhotoCapture + 'static,
    A: AudioBackend,
    U: Uploader,
{
    button: B,
    session: RecordingSession<C, A>,
    uploads: Option<UploadBatch<U>>,
    presenter: Presenter,
}

impl<B, C, A, U> RecorderLoop<B, C, A, U>
where
    B: ButtonEvents,
    C: PhotoCapture + 'static,
    A: AudioBackend,
    U: Uploader,
{
    /// `uploads` is `None` when uploading is disabled
    pub fn new(
        button: B,
        session: RecordingSession<C, A>,
        uploads: Option<UploadBatch<U>>,
        presenter: Presenter,
    ) -> Self {
        Self {
            button,
            session,
            uploads,
            presenter,
        }
    }

    pub fn session(&self) -> &RecordingSession<C, A> {
        &self.session
    }

    /// Alternate start and stop on each press until shutdown or the
    /// button closes. A shutdown while recording stops without uploading.
    pub async fn run(&mut self, shutdown: &mut ShutdownSignal) -> Result<(), RunError> {
        loop {
            tokio::select! {
                _ = shutdown.wait() => return Ok(()),
                pressed = self.button.wait_for_press() => match pressed {
                    Ok(()) => {}
                    Err(ButtonError::Closed) => return Ok(()),
                    Err(e) => return Err(e.into()),
                },
            }
            tokio::time::sleep(PRESS_DEBOUNCE).await;

            if let Err(e) = self.start().await {
                self.presenter.error(&e.to_string());
                self.settle(shutdown).await?;
                continue;
            }

            // The start press is usually still held
            let stop_requested = tokio::select! {
                _ = shutdown.wait() => false,
                held = async {
                    self.button.wait_for_release().await?;
                    self.button.wait_for_press().await
                } => match held {
                    Ok(()) => true,
                    Err(ButtonError::Closed) => false,
                    Err(e) => {
                        self.stop_without_upload().await;
                        return Err(e.into());
                    }
                },
            };

            if !stop_requested {
                self.stop_without_upload().await;
                return Ok(());
            }

            tokio::time::sleep(PRESS_DEBOUNCE).await;
            let completed = self.session.stop().await?;
            self.print_summary(&completed).await;
            self.upload(&completed).await;

            if !self.settle(shutdown).await? {
                return Ok(());
            }
        }
    }

    async fn start(&mut self) -> Result<(), SessionError> {
        let started = self.session.start().await?;
        self.presenter
            .status(&format!("Recording started ({})", started.session_id));
        if !started.audio_live {
            self.presenter
                .warn("Audio recorder failed to start, capturing photos only");
        }
        Ok(())
    }

    /// Wait for release then pause. Returns false on shutdown.
    async fn settle(&mut self, shutdown: &mut ShutdownSignal) -> Result<bool, RunError> {
        tokio::select! {
            _ = shutdown.wait() => return Ok(false),
            released = self.button.wait_for_release() => match released {
                Ok(()) => {}
                Err(ButtonError::Closed) => return Ok(false),
                Err(e) => return Err(e.into()),
            },
        }
        tokio::time::sleep(CYCLE_PAUSE).await;
        Ok(true)
    }

    async fn stop_without_upload(&mut self) {
        match self.session.stop().await {
            Ok(completed) => {
                self.print_summary(&completed).await;
                self.presenter
                    .warn("Shutting down, files kept on device without upload");
            }
            Err(e) => debug!(error = %e, "No session to stop on shutdown"),
        }
    }

    async fn print_summary(&self, completed: &CompletedSession) {
        self.presenter
            .success(&format!("Recording stopped ({})", completed.session_id));
        self.presenter
            .info(&format!("Photos captured: {}", completed.photo_count()));

        match &completed.audio_file {
            Some(audio) => {
                let size = tokio::fs::metadata(audio)
                    .await
                    .map(|m| human_readable_size(m.len()))
                    .unwrap_or_else(|_| "missing".to_string());
                self.presenter
                    .info(&format!("Audio: {} ({})", display_name(audio), size));
            }
            None => self.presenter.info("Audio: not recorded"),
        }
    }

    async fn upload(&mut self, completed: &CompletedSession) {
        let Some(batch) = &self.uploads else {
            self.presenter.info("Upload skipped (disabled)");
            return;
        };

        self.presenter.start_spinner("Uploading...");
        let callbacks = match self.presenter.spinner() {
            Some(bar) => {
                let done_bar = bar.clone();
                UploadCallbacks {
                    on_file_start: Some(Box::new(move |index, total, candidate| {
                        bar.set_message(format!(
                            "Uploading {}/{}: {}",
                            index,
                            total,
                            candidate.file_name()
                        ));
                    })),
                    on_file_done: Some(Box::new(move |report| {
                        let line = match &report.outcome {
                            FileOutcome::Uploaded(_) => {
                                format!("  uploaded {}", report.candidate.file_name())
                            }
                            FileOutcome::Skipped(reason) => {
                                format!("  {} {}", report.candidate.file_name(), reason)
                            }
                            FileOutcome::Failed(e) => {
                                format!("  failed {}: {}", report.candidate.file_name(), e)
                            }
                        };
                        done_bar.println(line);
                    })),
                }
            }
            None => UploadCallbacks::default(),
        };

        let summary = batch.run(completed, &callbacks).await;
        let line = Presenter::format_upload_summary(summary.succeeded, summary.total());

        if summary.total() == 0 {
            self.presenter.stop_spinner();
            self.presenter.warn("Nothing to upload");
        } else if summary.failed == 0 {
            self.presenter.spinner_success(&line);
        } else if summary.is_success() {
            self.presenter.spinner_success(&line);
            self.presenter
                .warn(&format!("{} file(s) failed to upload", summary.failed));
        } else {
            self.presenter.spinner_fail(&line);
        }
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Upload batch finished"
        );
    }
}

/// Resolve settings, reporting invalid values as a usage error
pub fn resolve_or_exit(config: &AppConfig, presenter: &Presenter) -> Result<SessionConfig, ExitCode> {
    config.resolve().map_err(|e| {
        presenter.error(&e.to_string());
        ExitCode::from(EXIT_USAGE_ERROR)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AudioError, AudioProcess, CaptureError, ServerResponse, StopOutcome, UploadError,
        UploadReceipt,
    };
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::io::{AsyncWriteExt, BufReader};

    struct FakeCamera;

    #[async_trait]
    impl PhotoCapture for FakeCamera {
        async fn capture(&self, output: &Path) -> Result<(), CaptureError> {
            std::fs::write(output, b"jpeg").map_err(|e| CaptureError::Failed(e.to_string()))
        }
    }

    struct FakeRecorder(PathBuf);

    #[async_trait]
    impl AudioProcess for FakeRecorder {
        fn id(&self) -> Option<u32> {
            None
        }

        async fn request_stop(&mut self, _grace: StdDuration) -> Result<StopOutcome, AudioError> {
            std::fs::write(&self.0, b"RIFF").map_err(|e| AudioError::StopFailed(e.to_string()))?;
            Ok(StopOutcome::Graceful)
        }
    }

    struct FakeMicrophone;

    #[async_trait]
    impl AudioBackend for FakeMicrophone {
        async fn launch(&self, output: &Path) -> Result<Box<dyn AudioProcess>, AudioError> {
            Ok(Box::new(FakeRecorder(output.to_path_buf())))
        }
    }

    #[derive(Clone, Default)]
    struct FakeServer {
        received: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Uploader for FakeServer {
        async fn upload(&self, path: &Path) -> Result<UploadReceipt, UploadError> {
            let name = display_name(path);
            self.received.lock().unwrap().push(name.clone());
            Ok(UploadReceipt {
                file_name: name,
                size_bytes: 4,
                response: ServerResponse::Text("ok".to_string()),
            })
        }
    }

    fn session(dir: &TempDir) -> RecordingSession<FakeCamera, FakeMicrophone> {
        RecordingSession::new(
            SessionConfig::with_dirs(dir.path().join("photos"), dir.path().join("recordings")),
            FakeCamera,
            FakeMicrophone,
        )
    }

    fn batch(server: &FakeServer) -> UploadBatch<FakeServer> {
        upload_batch(server.clone(), &UploadSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn two_presses_record_and_upload() {
        let dir = TempDir::new().unwrap();
        let server = FakeServer::default();
        let button = KeyboardButton::from_reader(&b"\n\n"[..]);
        let (_trigger, mut shutdown) = ShutdownSignal::channel();

        let mut recorder =
            RecorderLoop::new(button, session(&dir), Some(batch(&server)), Presenter::new());
        recorder.run(&mut shutdown).await.unwrap();

        assert!(!recorder.session().is_recording());
        let received = server.received.lock().unwrap().clone();
        assert!(received[0].ends_with(".wav"));
        assert!(received.len() >= 2);
        assert!(received[1..].iter().all(|name| name.contains("_photo_")));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_upload_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let button = KeyboardButton::from_reader(&b"\n\n"[..]);
        let (_trigger, mut shutdown) = ShutdownSignal::channel();

        let mut recorder: RecorderLoop<_, _, _, FakeServer> =
            RecorderLoop::new(button, session(&dir), None, Presenter::new());
        recorder.run(&mut shutdown).await.unwrap();

        assert!(!recorder.session().is_recording());
        assert!(dir.path().join("recordings").read_dir().unwrap().count() == 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_while_recording_stops_without_upload() {
        let dir = TempDir::new().unwrap();
        let server = FakeServer::default();
        let (mut keys, input) = tokio::io::duplex(64);
        keys.write_all(b"\n").await.unwrap();
        let button = KeyboardButton::from_reader(BufReader::new(input));
        let (trigger, mut shutdown) = ShutdownSignal::channel();

        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_secs(3)).await;
            trigger.trigger();
        });

        let mut recorder =
            RecorderLoop::new(button, session(&dir), Some(batch(&server)), Presenter::new());
        recorder.run(&mut shutdown).await.unwrap();

        assert!(!recorder.session().is_recording());
        assert!(server.received.lock().unwrap().is_empty());
        let photos = dir.path().join("photos").read_dir().unwrap().count();
        assert!(photos >= 1);
        drop(keys);
    }

    #[tokio::test]
    async fn closed_input_while_idle_exits_cleanly() {
        let dir = TempDir::new().unwrap();
        let button = KeyboardButton::from_reader(&b""[..]);
        let (_trigger, mut shutdown) = ShutdownSignal::channel();

        let mut recorder: RecorderLoop<_, _, _, FakeServer> =
            RecorderLoop::new(button, session(&dir), None, Presenter::new());

        recorder.run(&mut shutdown).await.unwrap();
        assert!(!dir.path().join("photos").exists());
    }
}
