//! Download progress accounting.

use serde::{Deserialize, Serialize};

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a raw byte count to megabytes rounded to two decimals.
///
/// Negative counts are reported by some hosts before a size is known and are
/// treated as zero.
pub fn bytes_to_mb(bytes: i64) -> f64 {
    if bytes < 0 {
        return 0.0;
    }
    let mb = bytes as f64 / BYTES_PER_MB;
    (mb * 100.0).round_ties_even() / 100.0
}

fn normalize(bytes: i64) -> u64 {
    u64::try_from(bytes).unwrap_or(0)
}

/// Byte counters for the model download of a single session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub expected_bytes: u64,
    pub downloaded_bytes: u64,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the announced download size and restart the counter.
    pub fn start(&mut self, expected_bytes: i64) {
        self.expected_bytes = normalize(expected_bytes);
        self.downloaded_bytes = 0;
    }

    /// Record a cumulative byte count.
    ///
    /// The counter never moves backwards and never exceeds the announced size.
    pub fn advance(&mut self, downloaded_bytes: i64) {
        let mut next = normalize(downloaded_bytes).max(self.downloaded_bytes);
        if self.expected_bytes > 0 {
            next = next.min(self.expected_bytes);
        }
        self.downloaded_bytes = next;
    }

    pub fn expected_mb(&self) -> f64 {
        bytes_to_mb(self.expected_bytes.min(i64::MAX as u64) as i64)
    }

    pub fn downloaded_mb(&self) -> f64 {
        bytes_to_mb(self.downloaded_bytes.min(i64::MAX as u64) as i64)
    }

    /// Whole-number percentage, 0 when the size is unknown.
    pub fn percent(&self) -> u32 {
        if self.expected_bytes == 0 {
            return 0;
        }
        let ratio = self.downloaded_bytes.min(self.expected_bytes) as f64 / self.expected_bytes as f64;
        (ratio * 100.0).clamp(0.0, 100.0) as u32
    }

    /// True while a sized download has not reached its announced size.
    pub fn is_in_flight(&self) -> bool {
        self.expected_bytes > 0 && self.downloaded_bytes < self.expected_bytes
    }

    pub fn label(&self) -> String {
        format!(
            "Downloading {} of {} MB...",
            self.downloaded_mb(),
            self.expected_mb()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: i64 = 1024 * 1024;

    #[test]
    fn test_bytes_to_mb_rounds_to_two_decimals() {
        assert_eq!(bytes_to_mb(10 * MB), 10.0);
        assert_eq!(bytes_to_mb(1_500_000), 1.43);
        assert_eq!(bytes_to_mb(0), 0.0);
    }

    #[test]
    fn test_negative_bytes_normalize_to_zero() {
        assert_eq!(bytes_to_mb(-42), 0.0);

        let mut progress = DownloadProgress::new();
        progress.start(-1);
        progress.advance(-5);
        assert_eq!(progress, DownloadProgress::default());
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut progress = DownloadProgress::new();
        progress.start(10 * MB);
        progress.advance(4 * MB);
        progress.advance(2 * MB);
        assert_eq!(progress.downloaded_bytes, (4 * MB) as u64);

        progress.advance(12 * MB);
        assert_eq!(progress.downloaded_bytes, progress.expected_bytes);
        assert_eq!(progress.percent(), 100);
        assert!(!progress.is_in_flight());
    }

    #[test]
    fn test_start_resets_counter() {
        let mut progress = DownloadProgress::new();
        progress.start(10 * MB);
        progress.advance(6 * MB);
        progress.start(20 * MB);
        assert_eq!(progress.downloaded_bytes, 0);
        assert!(progress.is_in_flight());
    }

    #[test]
    fn test_label() {
        let mut progress = DownloadProgress::new();
        progress.start(10 * MB);
        progress.advance(4 * MB);
        assert_eq!(progress.label(), "Downloading 4 of 10 MB...");
        assert_eq!(progress.percent(), 40);
    }
}
