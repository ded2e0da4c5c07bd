//! # Chunkpack
//!
//! Streaming, version-tolerant ingestion of QQ Chat Exporter `chunked-jsonl`
//! bundles.
//!
//! ## Overview
//!
//! A bundle is a `manifest.json` descriptor plus any number of JSONL chunk
//! files (and optionally an `avatars.json`). Chunkpack reads it as a lazy
//! stream of events:
//!
//! ```text
//! progress  meta  progress*  members  messages*  progress(done)  done
//! ```
//!
//! Records are normalized into [`NormalizedMessage`]s and senders are
//! aggregated into [`Participant`]s. Damage below the descriptor (a missing
//! chunk, a truncated line, a record with no sender) is skipped and counted,
//! never fatal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chunkpack::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let output = ChunkedJsonlParser::new().parse("export/manifest.json")?;
//!
//!     println!("{} ({})", output.meta.name, output.meta.kind);
//!     for message in output.messages.iter().take(10) {
//!         println!("{} [{}] {:?}", message.sender_account_name, message.kind, message.content);
//!     }
//!     if let Some(skipped) = output.summary.skipped_description() {
//!         eprintln!("{skipped}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming Events
//!
//! [`parse`](ChunkedJsonlParser::parse) keeps everything in memory. To hand
//! batches to a store as they are produced, iterate the events instead:
//!
//! ```rust,no_run
//! use chunkpack::prelude::*;
//!
//! let parser = ChunkedJsonlParser::with_config(IngestConfig::new().with_batch_size(2000));
//!
//! for event in parser.ingest("export/manifest.json") {
//!     match event {
//!         IngestEvent::Meta(meta) => println!("chat: {}", meta.name),
//!         IngestEvent::Members(members) => println!("{} members", members.len()),
//!         IngestEvent::Messages(batch) => println!("batch of {}", batch.len()),
//!         IngestEvent::Error(e) => return Err(e),
//!         _ => {}
//!     }
//! }
//! # Ok::<(), chunkpack::ChunkpackError>(())
//! ```
//!
//! ## Module Structure
//!
//! - [`ingest`]: [`ChunkedJsonlParser`], the [`Ingestion`](ingest::Ingestion) event iterator
//! - [`descriptor`]: `manifest.json` model and [`read_descriptor`](descriptor::read_descriptor)
//! - [`chunk`]: [`ChunkLocator`](chunk::ChunkLocator), path and count resolution
//! - [`streaming`]: [`RecordStream`](streaming::RecordStream), line-by-line chunk reader
//! - [`record`]: raw record model and canonical accessors
//! - [`classify`]: [`classify`](classify::classify), the message kind rules
//! - [`members`]: [`MemberTable`](members::MemberTable) aggregation
//! - [`avatars`]: [`AvatarMap`](avatars::AvatarMap) side-loading
//! - [`progress`]: byte-weighted progress snapshots
//! - [`event`], [`message`]: output types
//! - [`config`], [`logging`], [`error`]: run configuration, log sinks, errors
//! - [`prelude`]: Convenient re-exports

pub mod avatars;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod ingest;
mod lenient;
pub mod logging;
pub mod members;
pub mod message;
pub mod progress;
pub mod record;
pub mod streaming;

// Re-export the main types at the crate root for convenience
pub use error::{ChunkpackError, Result};
pub use ingest::ChunkedJsonlParser;
pub use members::Participant;
pub use message::{MessageKind, NormalizedMessage};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chunkpack::prelude::*;
/// ```
pub mod prelude {
    // Entry point
    pub use crate::ingest::{ChunkedJsonlParser, IngestOutput, Ingestion};

    // Output model
    pub use crate::event::{ChatKind, ChatMeta, IngestEvent, IngestSummary};
    pub use crate::members::Participant;
    pub use crate::message::{MessageKind, NormalizedMessage};
    pub use crate::progress::{Phase, ProgressCallback, ProgressSnapshot};

    // Configuration and callbacks
    pub use crate::config::IngestConfig;
    pub use crate::logging::{LogCallback, LogLevel};

    // Error types
    pub use crate::error::{ChunkpackError, Result};
}
