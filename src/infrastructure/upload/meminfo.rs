//! Free memory lookup for the upload pre-check

use std::path::Path;

/// Minimum free memory for an upload to be attempted, in MB
pub const MIN_FREE_MEMORY_MB: u64 = 100;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Available memory in MB from `/proc/meminfo`, or `None` if unreadable
pub async fn available_memory_mb() -> Option<u64> {
    available_memory_mb_from(Path::new(MEMINFO_PATH)).await
}

pub(crate) async fn available_memory_mb_from(path: &Path) -> Option<u64> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    parse_available_kb(&content).map(|kb| kb / 1024)
}

/// `MemAvailable` in kB, falling back to `MemFree` on older kernels
fn parse_available_kb(content: &str) -> Option<u64> {
    field_kb(content, "MemAvailable:").or_else(|| field_kb(content, "MemFree:"))
}

fn field_kb(content: &str, key: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}
