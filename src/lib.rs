//! Capture Pin - button-triggered photo and audio capture for Raspberry Pi
//!
//! One press starts a session: `arecord` records audio while `rpicam-still`
//! takes a photo every few seconds. The next press stops both and uploads
//! the files to an HTTP server.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Recording session, photo poller, upload batch, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (rpicam-still, arecord, GPIO sysfs, HTTP)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
