//! Capture value objects

mod duration;
mod image_format;
mod resolution;

pub use duration::{Duration, DEFAULT_PHOTO_INTERVAL_MS, DEFAULT_UPLOAD_TIMEOUT_SECS};
pub use image_format::ImageFormat;
pub use resolution::Resolution;
