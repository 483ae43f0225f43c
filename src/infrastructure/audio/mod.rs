//! Audio recording adapters

mod arecord;

pub use arecord::{ArecordBackend, ArecordProcess, ARECORD};
