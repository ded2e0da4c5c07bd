//! Streaming access to chunk files.
//!
//! Chunk files can run to hundreds of megabytes, so they are never read whole.
//! [`RecordStream`] pulls one line at a time through a `BufReader` and hands
//! out decoded [`RawRecord`](crate::record::RawRecord) values.
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkpack::streaming::RecordStream;
//!
//! let mut records = RecordStream::open("bundle/chunks/chunk_0001.jsonl", 64 * 1024)?;
//! for record in records.by_ref() {
//!     println!("{:?}: {}", record.id, record.content.text());
//! }
//! println!("dropped {} malformed lines", records.malformed_lines());
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Memory Usage
//!
//! | Chunk size | Resident |
//! |------------|----------|
//! | 10 MB | buffer + one line |
//! | 1 GB | buffer + one line |

mod jsonl;

pub use jsonl::RecordStream;
