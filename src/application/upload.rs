//! Upload batch use case

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use tracing::{info, warn};

use super::ports::{UploadError, UploadReceipt, Uploader};
use super::session::CompletedSession;
use crate::domain::config::BYTES_PER_MB;
use crate::domain::session::{display_name, MediaKind};

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// What happened to one candidate
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Uploaded(UploadReceipt),
    /// Not attempted; counts as a failure
    Skipped(String),
    Failed(UploadError),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }
}

/// Per-file result line
#[derive(Debug, Clone)]
pub struct FileReport {
    pub candidate: UploadCandidate,
    pub outcome: FileOutcome,
}

/// Aggregate result of one batch
#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FileReport>,
}

impl UploadSummary {
    /// At least one file made it to the server
    pub fn is_success(&self) -> bool {
        self.succeeded >= 1
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    fn push(&mut self, report: FileReport) {
        if report.outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(report);
    }
}

/// Callbacks for per-file progress
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct UploadCallbacks {
    /// Called with (index, total, candidate) before each file
    pub on_file_start: Option<Box<dyn Fn(usize, usize, &UploadCandidate) + Send + Sync>>,
    /// Called after each file
    pub on_file_done: Option<Box<dyn Fn(&FileReport) + Send + Sync>>,
}

/// Uploads everything a completed session produced, one file at a time
pub struct UploadBatch<U: Uploader> {
    uploader: U,
    max_file_size: u64,
    per_file_timeout: StdDuration,
}

impl<U: Uploader> UploadBatch<U> {
    pub fn new(uploader: U, max_file_size: u64, per_file_timeout: StdDuration) -> Self {
        Self {
            uploader,
            max_file_size,
            per_file_timeout,
        }
    }

    /// Upload every candidate of `session`, continuing past failures
    pub async fn run(&self, session: &CompletedSession, callbacks: &UploadCallbacks) -> UploadSummary {
        let candidates = collect_candidates(session).await;
        let total = candidates.len();
        let mut summary = UploadSummary::default();

        info!(session = %session.session_id, files = total, "Uploading session files");

        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Some(ref cb) = callbacks.on_file_start {
                cb(index + 1, total, &candidate);
            }

            let outcome = self.upload_one(&candidate).await;
            match &outcome {
                FileOutcome::Uploaded(_) => {
                    info!(file = %candidate.file_name(), size = candidate.size_bytes, "Uploaded")
                }
                FileOutcome::Skipped(reason) => {
                    warn!(file = %candidate.file_name(), %reason, "Upload skipped")
                }
                FileOutcome::Failed(e) => {
                    warn!(file = %candidate.file_name(), error = %e, "Upload failed")
                }
            }

            let report = FileReport { candidate, outcome };
            if let Some(ref cb) = callbacks.on_file_done {
                cb(&report);
            }
            summary.push(report);
        }

        summary
    }

    async fn upload_one(&self, candidate: &UploadCandidate) -> FileOutcome {
        if candidate.size_bytes > self.max_file_size {
            return FileOutcome::Skipped(format!(
                "skipped: too large ({:.2} MB)",
                candidate.size_bytes as f64 / BYTES_PER_MB as f64
            ));
        }

        match tokio::time::timeout(self.per_file_timeout, self.uploader.upload(&candidate.path)).await {
            Ok(Ok(receipt)) => FileOutcome::Uploaded(receipt),
            Ok(Err(e)) => FileOutcome::Failed(e),
            Err(_) => FileOutcome::Failed(UploadError::Timeout(self.per_file_timeout.as_secs())),
        }
    }
}

/// Audio file when present and non-empty, then every photo still on disk
pub async fn collect_candidates(session: &CompletedSession) -> Vec<UploadCandidate> {
    let mut candidates = Vec::with_capacity(session.photos.len() + 1);

    if let Some(audio) = &session.audio_file {
        match tokio::fs::metadata(audio).await {
            Ok(meta) if meta.len() > 0 => candidates.push(UploadCandidate {
                kind: MediaKind::Audio,
                path: audio.clone(),
                size_bytes: meta.len(),
            }),
            _ => warn!(file = %audio.display(), "Audio file missing or empty, not uploading"),
        }
    }

    for photo in &session.photos {
        match tokio::fs::metadata(photo).await {
            Ok(meta) => candidates.push(UploadCandidate {
                kind: MediaKind::Photo,
                path: photo.clone(),
                size_bytes: meta.len(),
            }),
            Err(_) => warn!(file = %photo.display(), "Photo disappeared before upload"),
        }
    }

    candidates
}
