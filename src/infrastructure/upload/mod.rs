//! Upload server adapters

mod http;
mod meminfo;

pub use http::{HttpUploader, RemoteFile};
pub use meminfo::{available_memory_mb, MIN_FREE_MEMORY_MB};
