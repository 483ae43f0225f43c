//! Still-capture adapters

mod rpicam;

pub use rpicam::{RpicamCapture, RPICAM_STILL};
