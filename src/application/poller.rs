//! Background photo poller
//!
//! Fires the capture backend on a fixed period until asked to stop. Captured
//! paths go into a shared [`PhotoLedger`]; the owner reads them back only
//! after joining the task through [`PollerHandle::join`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::{CaptureError, PhotoCapture};
use crate::domain::recording::ImageFormat;
use crate::domain::session::{photo_file_name, SessionId};

/// Granularity at which a sleeping poller notices a stop request
pub const STOP_POLL_TICK: StdDuration = StdDuration::from_millis(100);

/// Photos captured during one session.
///
/// Append-only while open; once sealed every further append is refused, so
/// a poller that outlives its join bound cannot change what was handed out.
#[derive(Debug, Default)]
pub struct PhotoLedger {
    photos: Vec<PathBuf>,
    sealed: bool,
}

impl PhotoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a photo; returns false if the ledger is already sealed
    pub fn record(&mut self, path: PathBuf) -> bool {
        if self.sealed {
            return false;
        }
        self.photos.push(path);
        true
    }

    /// Close the ledger and return its final contents
    pub fn seal(&mut self) -> Vec<PathBuf> {
        self.sealed = true;
        self.photos.clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn photos(&self) -> &[PathBuf] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

/// Ledger shared between the poller task and the session
pub type SharedLedger = Arc<Mutex<PhotoLedger>>;

/// Lock the ledger, recovering from a poisoned mutex.
///
/// Every critical section is a single push or clone, so a poisoned lock
/// still guards a consistent list.
pub fn lock_ledger(ledger: &SharedLedger) -> MutexGuard<'_, PhotoLedger> {
    ledger.lock().unwrap_or_else(|e| e.into_inner())
}

/// Periodic photo capture loop for one session
pub struct PhotoPoller<C: PhotoCapture> {
    capture: Arc<C>,
    session_id: SessionId,
    photo_dir: PathBuf,
    format: ImageFormat,
    interval: StdDuration,
    ledger: SharedLedger,
}

impl<C: PhotoCapture + 'static> PhotoPoller<C> {
    pub fn new(
        capture: Arc<C>,
        session_id: SessionId,
        photo_dir: PathBuf,
        format: ImageFormat,
        interval: StdDuration,
        ledger: SharedLedger,
    ) -> Self {
        Self {
            capture,
            session_id,
            photo_dir,
            format,
            interval,
            ledger,
        }
    }

    /// Run the loop on a background task
    pub fn spawn(self) -> PollerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let task = tokio::spawn(async move { self.run(flag).await });
        PollerHandle { stop, task }
    }

    /// Capture until `stop` is set. Returns the number of attempts made.
    pub async fn run(self, stop: Arc<AtomicBool>) -> u32 {
        let mut attempts: u32 = 0;

        while !stop.load(Ordering::SeqCst) {
            // Failed attempts consume a number too, leaving visible gaps
            attempts += 1;
            self.attempt(attempts).await;
            sleep_unless_stopped(self.interval, &stop).await;
        }

        debug!(session = %self.session_id, attempts, "Photo poller stopped");
        attempts
    }

    async fn attempt(&self, counter: u32) {
        let name = photo_file_name(&self.session_id, counter, self.format);
        let path = self.photo_dir.join(&name);

        let result = match self.capture.capture(&path).await {
            Ok(()) => confirm_written(&path).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                if lock_ledger(&self.ledger).record(path) {
                    info!(photo = counter, file = %name, size, "Photo captured");
                } else {
                    debug!(photo = counter, file = %name, "Session already closed, photo not recorded");
                }
            }
            Err(e) => warn!(photo = counter, error = %e, "Photo capture failed"),
        }
    }
}

/// Size of the written file, or an error if it is missing or empty
async fn confirm_written(path: &std::path::Path) -> Result<u64, CaptureError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        _ => Err(CaptureError::EmptyOutput(path.display().to_string())),
    }
}

/// Sleep for `total`, waking every [`STOP_POLL_TICK`] to check `stop`
async fn sleep_unless_stopped(total: StdDuration, stop: &AtomicBool) {
    let mut elapsed = StdDuration::ZERO;
    while elapsed < total && !stop.load(Ordering::SeqCst) {
        let step = STOP_POLL_TICK.min(total - elapsed);
        tokio::time::sleep(step).await;
        elapsed += step;
    }
}

/// How a poller ended when joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerExit {
    /// Observed the stop flag and returned
    Finished { attempts: u32 },
    /// Did not finish within the join bound and was aborted
    Overran,
    /// The task panicked or was cancelled
    Crashed(String),
}

/// Owned handle to a running poller
pub struct PollerHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<u32>,
}

impl PollerHandle {
    /// Ask the loop to stop at its next check
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait up to `limit` for it to exit.
    ///
    /// An overrunning task is aborted; whatever it was doing can no longer
    /// reach the ledger once the caller seals it.
    pub async fn join(mut self, limit: StdDuration) -> PollerExit {
        self.request_stop();
        match tokio::time::timeout(limit, &mut self.task).await {
            Ok(Ok(attempts)) => PollerExit::Finished { attempts },
            Ok(Err(e)) => PollerExit::Crashed(e.to_string()),
            Err(_) => {
                self.task.abort();
                PollerExit::Overran
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}
