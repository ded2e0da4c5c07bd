//! Ingestion configuration.
//!
//! [`IngestConfig`] holds the tunables of a run. Callbacks are not part of it;
//! attach them to [`ChunkedJsonlParser`](crate::ingest::ChunkedJsonlParser).
//!
//! # Example
//!
//! ```rust
//! use chunkpack::config::IngestConfig;
//! use chunkpack::ingest::ChunkedJsonlParser;
//!
//! let config = IngestConfig::new()
//!     .with_batch_size(1000)
//!     .with_buffer_size(256 * 1024);
//!
//! let parser = ChunkedJsonlParser::with_config(config);
//! ```
//!
//! Configs deserialize with missing fields filled from the defaults:
//!
//! ```rust
//! use chunkpack::config::IngestConfig;
//!
//! let config: IngestConfig = serde_json::from_str(r#"{"batchSize": 200}"#)?;
//! assert_eq!(config.batch_size, 200);
//! assert_eq!(config.min_year, 2000);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestConfig {
    /// Messages per emitted batch (default: 5000, 0 is treated as 1)
    pub batch_size: usize,

    /// Accepted messages between progress snapshots (default: 5000, 0 disables)
    pub progress_interval: u64,

    /// Read buffer per chunk file (default: 64KB)
    pub buffer_size: usize,

    /// Earliest accepted calendar year (default: 2000)
    pub min_year: i32,

    /// Latest accepted calendar year (default: 2100)
    pub max_year: i32,

    /// Prepended to the text of recalled messages (default: `"[已撤回] "`)
    pub recalled_prefix: String,

    /// Chat name used when the descriptor has none (default: `"未知群聊"`)
    pub fallback_chat_name: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 5000,
            progress_interval: 5000,
            buffer_size: 64 * 1024, // 64KB
            min_year: 2000,
            max_year: 2100,
            recalled_prefix: "[已撤回] ".to_string(),
            fallback_chat_name: "未知群聊".to_string(),
        }
    }
}

impl IngestConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message batch size.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets how many accepted messages pass between progress snapshots.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Sets the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the accepted calendar-year range (inclusive).
    #[must_use]
    pub fn with_year_range(mut self, min_year: i32, max_year: i32) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    #[must_use]
    pub fn with_recalled_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.recalled_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_fallback_chat_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_chat_name = name.into();
        self
    }

    /// Batch size with the zero case folded to 1.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
