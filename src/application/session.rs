//! Recording session use case
//!
//! Drives one button-delimited cycle: start audio and the photo poller,
//! then tear both down and hand back everything that was captured.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::audio_controller::AudioController;
use super::poller::{lock_ledger, PhotoLedger, PhotoPoller, PollerExit, PollerHandle, SharedLedger};
use super::ports::{AudioBackend, PhotoCapture, StopOutcome};
use crate::domain::config::SessionConfig;
use crate::domain::session::{
    audio_file_path, photo_file_name, InvalidStateTransition, SessionId, SessionLifecycle,
    SessionState,
};

/// Errors from the recording session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Cannot create directory {path}: {message}")]
    Storage { path: String, message: String },
}

/// Result of a successful `start()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub audio_file: PathBuf,
    /// False when the audio leg failed to launch
    pub audio_live: bool,
}

/// Everything one finished cycle produced.
///
/// Only `stop()` creates this, after the poller has been joined and the
/// ledger sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub session_id: SessionId,
    /// Set only when the audio process was launched
    pub audio_file: Option<PathBuf>,
    pub photos: Vec<PathBuf>,
    pub audio_stop: Option<StopOutcome>,
    pub poller_exit: PollerExit,
}

impl CompletedSession {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }
}

/// Per-cycle resources, present only while recording
struct ActiveCycle {
    audio_file: PathBuf,
    audio_live: bool,
    poller: PollerHandle,
}

/// Reusable recording session
pub struct RecordingSession<C, A>
where
    C: PhotoCapture + 'static,
    A: AudioBackend,
{
    config: SessionConfig,
    capture: Arc<C>,
    audio: AudioController<A>,
    lifecycle: SessionLifecycle,
    session_id: Option<SessionId>,
    ledger: SharedLedger,
    active: Option<ActiveCycle>,
}

impl<C, A> RecordingSession<C, A>
where
    C: PhotoCapture + 'static,
    A: AudioBackend,
{
    pub fn new(config: SessionConfig, capture: C, audio_backend: A) -> Self {
        let audio = AudioController::new(audio_backend, config.audio.stop_grace.as_std());
        Self {
            config,
            capture: Arc::new(capture),
            audio,
            lifecycle: SessionLifecycle::new(),
            session_id: None,
            ledger: Arc::default(),
            active: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn is_recording(&self) -> bool {
        self.lifecycle.is_recording()
    }

    /// Id of the current cycle, or of the last one once stopped
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Audio file of the current cycle
    pub fn audio_file(&self) -> Option<&Path> {
        self.active.as_ref().map(|cycle| cycle.audio_file.as_path())
    }

    /// Snapshot of the photos captured so far
    pub fn captured_photos(&self) -> Vec<PathBuf> {
        lock_ledger(&self.ledger).photos().to_vec()
    }

    /// Begin a new cycle
    pub async fn start(&mut self) -> Result<SessionStarted, SessionError> {
        self.lifecycle.ensure_can_begin()?;

        ensure_dir(&self.config.photo_dir).await?;
        ensure_dir(&self.config.recordings_dir).await?;
        let session_id = self
            .unused_id(SessionId::generate(self.session_id.as_ref()))
            .await;

        let audio_file = audio_file_path(&self.config.recordings_dir, &session_id);
        let audio_live = match self.audio.start(&audio_file).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Audio recording unavailable, continuing with photos only");
                false
            }
        };

        let ledger: SharedLedger = Arc::new(std::sync::Mutex::new(PhotoLedger::new()));
        let poller = PhotoPoller::new(
            Arc::clone(&self.capture),
            session_id.clone(),
            self.config.photo_dir.clone(),
            self.config.capture.format,
            self.config.photo_interval.as_std(),
            Arc::clone(&ledger),
        )
        .spawn();

        self.ledger = ledger;
        self.session_id = Some(session_id.clone());
        self.active = Some(ActiveCycle {
            audio_file: audio_file.clone(),
            audio_live,
            poller,
        });
        self.lifecycle.begin()?;

        info!(session = %session_id, audio_live, "Recording session started");

        Ok(SessionStarted {
            session_id,
            audio_file,
            audio_live,
        })
    }

    /// Bump the counter while files of an earlier run already use `id`
    async fn unused_id(&self, mut id: SessionId) -> SessionId {
        loop {
            let audio = audio_file_path(&self.config.recordings_dir, &id);
            let first_photo = self
                .config
                .photo_dir
                .join(photo_file_name(&id, 1, self.config.capture.format));

            if !path_taken(&audio).await && !path_taken(&first_photo).await {
                return id;
            }
            debug!(session = %id, "Session id already used on disk");
            id = id.next();
        }
    }

    /// End the current cycle and collect what it produced
    pub async fn stop(&mut self) -> Result<CompletedSession, SessionError> {
        self.lifecycle.ensure_can_finish()?;
        let (Some(cycle), Some(session_id)) = (self.active.take(), self.session_id.clone()) else {
            return Err(SessionError::InvalidState(InvalidStateTransition {
                current_state: SessionState::Idle,
                action: "stop recording",
            }));
        };

        cycle.poller.request_stop();
        let audio_stop = self.audio.stop().await;

        let poller_exit = cycle
            .poller
            .join(self.config.poller_join_timeout.as_std())
            .await;
        match &poller_exit {
            PollerExit::Finished { attempts } => debug!(attempts, "Photo poller joined"),
            PollerExit::Overran => warn!(
                timeout_ms = self.config.poller_join_timeout.as_millis(),
                "Photo poller did not stop in time and was aborted"
            ),
            PollerExit::Crashed(reason) => warn!(%reason, "Photo poller ended abnormally"),
        }

        let photos = lock_ledger(&self.ledger).seal();
        self.lifecycle.finish()?;

        info!(
            session = %session_id,
            photos = photos.len(),
            audio = ?audio_stop,
            "Recording session stopped"
        );

        Ok(CompletedSession {
            session_id,
            audio_file: cycle.audio_live.then_some(cycle.audio_file),
            photos,
            audio_stop,
            poller_exit,
        })
    }
}

async fn path_taken(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn ensure_dir(path: &Path) -> Result<(), SessionError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| SessionError::Storage {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}
