use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where the finished image lives. Falls back to the working directory when
/// the platform reports no document directory.
pub fn document_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A fresh path in the OS temp dir, unique per call so overlapping transfers
/// never share a partial file.
pub fn temp_download_path() -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("gradient-download-{}-{}.tmp", process::id(), seq))
}
