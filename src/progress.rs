//! Byte-weighted progress estimation.
//!
//! Chunk files are read one after another. The bytes done at any moment are
//! the sizes of all finished chunks plus an estimate for the current one:
//!
//! ```text
//! partial = records_read / expected_count * chunk_size
//! ```
//!
//! A chunk with an unknown expected count contributes nothing until it is
//! finished. Estimates are clamped so a chunk never reports more than its own
//! size and a snapshot never exceeds the total.
//!
//! # Example
//!
//! ```rust
//! use chunkpack::progress::{self, Phase, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|snapshot| {
//!     if let Some(pct) = snapshot.percentage() {
//!         println!("{:?}: {:.1}%", snapshot.phase, pct);
//!     }
//! });
//!
//! let partial = progress::chunk_partial_bytes(50, 100, 4096);
//! callback(progress::estimate(Phase::Parsing, 1000 + partial, 10_000, 150, ""));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stage of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Parsing,
    Done,
}

/// Point-in-time progress of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub phase: Phase,
    /// Estimated bytes consumed across all chunk files
    pub bytes_processed: u64,
    /// Sum of sizes of every chunk file present at start
    pub total_bytes: u64,
    /// Messages accepted so far
    pub messages_processed: u64,
    /// Human-readable status line
    pub label: String,
}

impl ProgressSnapshot {
    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// An empty bundle (zero total bytes) is reported as 100% once done and
    /// `None` while parsing.
    pub fn percentage(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return self.is_complete().then_some(100.0);
        }
        Some((self.bytes_processed as f64 / self.total_bytes as f64) * 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.bytes_processed)
    }
}

/// Builds a snapshot, clamping `bytes_processed` to `total_bytes`.
pub fn estimate(
    phase: Phase,
    bytes_processed: u64,
    total_bytes: u64,
    messages_processed: u64,
    label: impl Into<String>,
) -> ProgressSnapshot {
    ProgressSnapshot {
        phase,
        bytes_processed: bytes_processed.min(total_bytes),
        total_bytes,
        messages_processed,
        label: label.into(),
    }
}

/// Estimated bytes consumed within one chunk.
///
/// Zero when `expected_count` is unknown; never more than `chunk_size`.
pub fn chunk_partial_bytes(records_read: u64, expected_count: u64, chunk_size: u64) -> u64 {
    if expected_count == 0 {
        return 0;
    }
    let ratio = (records_read as f64 / expected_count as f64).min(1.0);
    ((ratio * chunk_size as f64).floor() as u64).min(chunk_size)
}

/// Callback type for receiving progress updates.
///
/// Invoked with every snapshot the run emits, in order.
pub type ProgressCallback = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Creates a no-op progress callback.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints to stderr.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|snapshot| match snapshot.percentage() {
        Some(pct) => eprintln!("Progress: {pct:.1}% ({} messages)", snapshot.messages_processed),
        None => eprintln!("Progress: {} messages", snapshot.messages_processed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let snapshot = estimate(Phase::Parsing, 500, 1000, 50, "");
        assert_eq!(snapshot.percentage(), Some(50.0));
        assert_eq!(snapshot.remaining_bytes(), 500);
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn test_empty_bundle_percentage() {
        assert_eq!(estimate(Phase::Parsing, 0, 0, 0, "").percentage(), None);
        assert_eq!(estimate(Phase::Done, 0, 0, 0, "").percentage(), Some(100.0));
    }

    #[test]
    fn test_estimate_clamps_to_total() {
        let snapshot = estimate(Phase::Parsing, 5000, 1000, 1, "");
        assert_eq!(snapshot.bytes_processed, 1000);
    }

    #[test]
    fn test_chunk_partial_bytes() {
        assert_eq!(chunk_partial_bytes(50, 100, 1000), 500);
        assert_eq!(chunk_partial_bytes(1, 3, 1000), 333);
        assert_eq!(chunk_partial_bytes(10, 0, 1000), 0);
        assert_eq!(chunk_partial_bytes(250, 100, 1000), 1000);
        assert_eq!(chunk_partial_bytes(0, 100, 1000), 0);
    }

    #[test]
    fn test_partial_bytes_monotonic() {
        let mut last = 0;
        for read in 0..=120 {
            let bytes = chunk_partial_bytes(read, 100, 777);
            assert!(bytes >= last);
            last = bytes;
        }
        assert_eq!(last, 777);
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = estimate(Phase::Done, 10, 10, 3, "done");
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"phase\":\"done\""));
        assert!(json.contains("\"bytesProcessed\":10"));
    }

    #[test]
    fn test_no_progress_callback() {
        let callback = no_progress();
        callback(estimate(Phase::Parsing, 0, 0, 0, ""));
    }

    #[test]
    fn test_progress_callback_type() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = counter.clone();

        let callback: ProgressCallback = Arc::new(move |snapshot| {
            counter_clone.store(snapshot.bytes_processed, Ordering::SeqCst);
        });

        callback(estimate(Phase::Parsing, 42, 100, 0, ""));
        assert_eq!(counter.load(Ordering::SeqCst), 42);
    }
}
