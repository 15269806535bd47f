/// Byte counters for one transfer attempt, reset whenever a new download
/// starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub downloaded: u64,
    /// Advertised content length; `None` when the server omits it.
    pub total: Option<u64>,
}

impl ProgressState {
    pub fn new(downloaded: u64, total: Option<u64>) -> Self {
        Self { downloaded, total }
    }

    /// Normalized bar position. Unknown or zero totals report 0.0.
    pub fn fraction(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => self.downloaded as f32 / total as f32,
            _ => 0.0,
        }
    }

    /// Truncated integer percent for the label.
    pub fn percent(&self) -> u64 {
        match self.total {
            Some(total) if total > 0 => (self.downloaded as u128 * 100 / total as u128) as u64,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Downloading,
    Completed,
    Failed,
}
