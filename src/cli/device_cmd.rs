//! On-device commands: single snapshot and the dependency checklist

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::application::ports::{CaptureError, PhotoCapture};
use crate::domain::recording::ImageFormat;
use crate::infrastructure::check_dependencies;

use super::presenter::Presenter;

/// `capture_YYYYMMDD_HHMMSS.{ext}`
pub fn snapshot_file_name(time: NaiveDateTime, format: ImageFormat) -> String {
    format!(
        "capture_{}.{}",
        time.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Capture one photo into `photo_dir` now. Returns its path and size.
pub async fn take_snapshot<C: PhotoCapture>(
    capture: &C,
    photo_dir: &Path,
    format: ImageFormat,
) -> Result<(PathBuf, u64), CaptureError> {
    tokio::fs::create_dir_all(photo_dir)
        .await
        .map_err(|e| CaptureError::Failed(format!("Cannot create {}: {}", photo_dir.display(), e)))?;

    let path = photo_dir.join(snapshot_file_name(Local::now().naive_local(), format));
    capture.capture(&path).await?;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.len() > 0 => Ok((path, meta.len())),
        _ => Err(CaptureError::EmptyOutput(path.display().to_string())),
    }
}

/// Print the tool checklist. Returns false when something is missing.
pub async fn handle_doctor(presenter: &Presenter) -> bool {
    let report = check_dependencies(true).await;

    presenter.info("Checking dependencies");
    for check in &report.checks {
        presenter.check(check.name, check.available, check.install_hint);
    }

    if report.all_available() {
        presenter.success("All dependencies available");
        true
    } else {
        presenter.error("Some dependencies are missing");
        false
    }
}
