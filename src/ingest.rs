//! Ingestion driver.
//!
//! [`ChunkedJsonlParser::ingest`] returns an [`Ingestion`], a lazy iterator of
//! [`IngestEvent`]s. Nothing is read until the first `next()`. Chunks are
//! processed in declared order and at most one chunk file is open at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkpack::config::IngestConfig;
//! use chunkpack::event::IngestEvent;
//! use chunkpack::ingest::ChunkedJsonlParser;
//! use chunkpack::progress::stderr_progress;
//!
//! let parser = ChunkedJsonlParser::with_config(IngestConfig::new().with_batch_size(1000))
//!     .with_progress(stderr_progress());
//!
//! for event in parser.ingest("export/manifest.json") {
//!     match event {
//!         IngestEvent::Messages(batch) => println!("{} messages", batch.len()),
//!         IngestEvent::Error(e) => eprintln!("failed: {e}"),
//!         _ => {}
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::avatars::AvatarMap;
use crate::chunk::{ChunkLocator, ResolvedChunk};
use crate::classify::classify;
use crate::config::IngestConfig;
use crate::descriptor::{ChunkEntry, read_descriptor};
use crate::error::{ChunkpackError, Result};
use crate::event::{ChatMeta, IngestEvent, IngestSummary, PLATFORM_QQ};
use crate::logging::{self, LogCallback, LogLevel};
use crate::members::{MemberTable, Participant};
use crate::message::NormalizedMessage;
use crate::progress::{self, Phase, ProgressCallback};
use crate::record::{RawRecord, validate_year};
use crate::streaming::RecordStream;

/// Ingests QQ Chat Exporter `chunked-jsonl` bundles.
#[derive(Clone, Default)]
pub struct ChunkedJsonlParser {
    config: IngestConfig,
    on_progress: Option<ProgressCallback>,
    on_log: Option<LogCallback>,
}

impl ChunkedJsonlParser {
    /// Creates a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: IngestConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Attaches a callback invoked with every progress snapshot.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Attaches a callback invoked with every run log line.
    #[must_use]
    pub fn with_logger(mut self, callback: LogCallback) -> Self {
        self.on_log = Some(callback);
        self
    }

    pub fn name(&self) -> &'static str {
        "QQ Chat Exporter (chunked-jsonl)"
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Starts a lazy ingestion of the bundle whose descriptor is at `path`.
    pub fn ingest(&self, path: impl AsRef<Path>) -> Ingestion {
        Ingestion::new(self.clone(), path.as_ref())
    }

    /// Ingests a whole bundle into memory.
    ///
    /// Returns the fatal error if the run emitted one.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<IngestOutput> {
        let mut meta = None;
        let mut members = Vec::new();
        let mut messages = Vec::new();
        let mut summary = None;

        for event in self.ingest(path) {
            match event {
                IngestEvent::Progress(_) => {}
                IngestEvent::Meta(m) => meta = Some(m),
                IngestEvent::Members(m) => members = m,
                IngestEvent::Messages(batch) => messages.extend(batch),
                IngestEvent::Error(e) => return Err(e),
                IngestEvent::Done(s) => summary = Some(s),
            }
        }

        match (meta, summary) {
            (Some(meta), Some(summary)) => Ok(IngestOutput {
                meta,
                members,
                messages,
                summary,
            }),
            _ => Err(ChunkpackError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "ingestion ended without a completion event",
            ))),
        }
    }
}

impl std::fmt::Debug for ChunkedJsonlParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedJsonlParser")
            .field("config", &self.config)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_log", &self.on_log.is_some())
            .finish()
    }
}

/// Everything a run produced, collected by [`ChunkedJsonlParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutput {
    pub meta: ChatMeta,
    pub members: Vec<Participant>,
    pub messages: Vec<NormalizedMessage>,
    pub summary: IngestSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    Streaming,
    Members,
    Messages,
    Finishing,
    Finished,
}

struct ActiveChunk {
    chunk: ResolvedChunk,
    size: u64,
    records_read: u64,
    stream: RecordStream<BufReader<File>>,
}

/// A running ingestion; see the [module docs](self).
pub struct Ingestion {
    parser: ChunkedJsonlParser,
    descriptor_path: PathBuf,
    base_dir: PathBuf,
    stage: Stage,
    pending: VecDeque<IngestEvent>,

    chunks_dir: String,
    entries: Vec<ChunkEntry>,
    next_entry: usize,
    active: Option<ActiveChunk>,

    avatars: AvatarMap,
    members: MemberTable,
    messages: Vec<NormalizedMessage>,
    batches: std::vec::IntoIter<NormalizedMessage>,

    total_bytes: u64,
    completed_bytes: u64,
    summary: IngestSummary,
}

impl Ingestion {
    fn new(parser: ChunkedJsonlParser, descriptor_path: &Path) -> Self {
        Self {
            parser,
            descriptor_path: descriptor_path.to_path_buf(),
            base_dir: bundle_dir(descriptor_path),
            stage: Stage::Start,
            pending: VecDeque::new(),
            chunks_dir: String::new(),
            entries: Vec::new(),
            next_entry: 0,
            active: None,
            avatars: AvatarMap::new(),
            members: MemberTable::new(),
            messages: Vec::new(),
            batches: Vec::new().into_iter(),
            total_bytes: 0,
            completed_bytes: 0,
            summary: IngestSummary::default(),
        }
    }

    /// Running tallies; final once [`IngestEvent::Done`] has been yielded.
    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }

    /// Directory chunk and avatar paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn log(&self, level: LogLevel, message: &str) {
        logging::emit(level, message, self.parser.on_log.as_ref());
    }

    fn push_progress(&mut self, phase: Phase, bytes: u64, label: String) {
        let snapshot = progress::estimate(
            phase,
            bytes,
            self.total_bytes,
            self.summary.message_count,
            label,
        );
        if let Some(callback) = &self.parser.on_progress {
            callback(snapshot.clone());
        }
        self.pending.push_back(IngestEvent::Progress(snapshot));
    }

    // ========================================================================
    // Stages
    // ========================================================================

    fn start(&mut self) {
        let descriptor = match read_descriptor(&self.descriptor_path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.log(LogLevel::Error, &e.to_string());
                self.pending.push_back(IngestEvent::Error(e));
                self.stage = Stage::Finished;
                return;
            }
        };

        let locator = ChunkLocator::new(&self.base_dir, &descriptor.chunked.chunks_dir);
        self.total_bytes = locator.total_bytes(&descriptor.chunked.chunks);
        self.summary.expected_messages = descriptor.statistics.total_messages;
        self.push_progress(Phase::Parsing, 0, String::new());

        self.log(
            LogLevel::Info,
            &format!(
                "Parsing chunked-jsonl export (v{}): {} chunks, {} messages expected",
                descriptor.metadata.version,
                descriptor.chunked.chunks.len(),
                descriptor.statistics.total_messages
            ),
        );

        self.avatars = AvatarMap::load(&self.base_dir, descriptor.avatars.as_ref());
        if !self.avatars.is_empty() {
            self.log(LogLevel::Info, &format!("Loaded {} avatars", self.avatars.len()));
        }

        let config = &self.parser.config;
        let meta = ChatMeta {
            name: descriptor.chat_name(&config.fallback_chat_name).to_string(),
            platform: PLATFORM_QQ.to_string(),
            kind: descriptor.chat_kind(),
            owner_id: descriptor.owner_id().map(str::to_string),
        };
        self.pending.push_back(IngestEvent::Meta(meta));

        self.chunks_dir = descriptor.chunked.chunks_dir;
        self.entries = descriptor.chunked.chunks;
        self.stage = Stage::Streaming;
    }

    /// Advances the current chunk until a progress snapshot is due or the
    /// chunk ends, opening the next chunk when none is active.
    fn pump(&mut self) {
        let Some(mut active) = self.active.take() else {
            if !self.open_next_chunk() {
                self.stage = Stage::Members;
            }
            return;
        };

        while let Some(record) = active.stream.next() {
            active.records_read += 1;
            if self.accept(record) && self.progress_due() {
                let partial = progress::chunk_partial_bytes(
                    active.records_read,
                    active.chunk.expected_count,
                    active.size,
                );
                let label = format!("Processed {} messages...", self.summary.message_count);
                self.push_progress(Phase::Parsing, self.completed_bytes + partial, label);
                self.active = Some(active);
                return;
            }
        }

        self.close_chunk(active);
    }

    fn open_next_chunk(&mut self) -> bool {
        while self.next_entry < self.entries.len() {
            let index = self.next_entry;
            self.next_entry += 1;

            let resolved = ChunkLocator::new(&self.base_dir, &self.chunks_dir)
                .resolve(index, &self.entries[index]);
            let chunk = match resolved {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.summary.missing_chunks += 1;
                    self.log(LogLevel::Error, &e.to_string());
                    continue;
                }
            };

            let Some(size) = chunk.file_size() else {
                self.summary.missing_chunks += 1;
                self.log(
                    LogLevel::Error,
                    &format!("Chunk file not found: {}", chunk.path.display()),
                );
                continue;
            };

            match RecordStream::open(&chunk.path, self.parser.config.buffer_size) {
                Ok(stream) => {
                    self.log(
                        LogLevel::Info,
                        &format!(
                            "Parsing chunk {} ({} messages)",
                            chunk.relative_path, chunk.expected_count
                        ),
                    );
                    self.active = Some(ActiveChunk {
                        chunk,
                        size,
                        records_read: 0,
                        stream,
                    });
                    return true;
                }
                Err(e) => {
                    self.summary.missing_chunks += 1;
                    self.log(
                        LogLevel::Error,
                        &format!("Cannot open chunk {}: {e}", chunk.path.display()),
                    );
                }
            }
        }
        false
    }

    fn close_chunk(&mut self, mut active: ActiveChunk) {
        let malformed = active.stream.malformed_lines();
        self.summary.malformed_lines += malformed;
        if let Some(e) = active.stream.take_error() {
            self.log(
                LogLevel::Warn,
                &format!(
                    "Reading chunk {} stopped early: {e}",
                    active.chunk.relative_path
                ),
            );
        }
        tracing::debug!(
            chunk = %active.chunk.relative_path,
            records = active.records_read,
            malformed,
            "chunk finished"
        );
        self.completed_bytes += active.size;
    }

    /// Turns one record into a message. Returns `false` if it was skipped.
    fn accept(&mut self, record: RawRecord) -> bool {
        let Some(who) = self.members.observe(&record.sender, &self.avatars) else {
            self.summary.skipped += 1;
            return false;
        };

        let config = &self.parser.config;
        let timestamp = record
            .unix_seconds()
            .and_then(|secs| validate_year(secs, config.min_year, config.max_year));
        let Some(timestamp) = timestamp else {
            self.summary.skipped += 1;
            return false;
        };

        let kind = classify(&record);
        let text = if record.is_recalled() {
            format!("{}{}", config.recalled_prefix, record.content.text())
        } else {
            record.content.text().to_string()
        };

        let mut message =
            NormalizedMessage::new(who.platform_id, who.account_name, timestamp, kind)
                .with_content(text);
        message.platform_message_id = record.id;
        message.sender_group_nickname = who.group_nickname;

        self.messages.push(message);
        self.summary.message_count += 1;
        true
    }

    fn progress_due(&self) -> bool {
        let interval = self.parser.config.progress_interval;
        interval > 0 && self.summary.message_count % interval == 0
    }

    fn emit_members(&mut self) {
        let members = std::mem::take(&mut self.members).into_participants();
        self.summary.member_count = members.len() as u64;
        self.pending.push_back(IngestEvent::Members(members));
        self.batches = std::mem::take(&mut self.messages).into_iter();
        self.stage = Stage::Messages;
    }

    fn emit_batch(&mut self) {
        let size = self.parser.config.effective_batch_size();
        let batch: Vec<_> = self.batches.by_ref().take(size).collect();
        if batch.is_empty() {
            self.stage = Stage::Finishing;
        } else {
            self.pending.push_back(IngestEvent::Messages(batch));
        }
    }

    fn finish(&mut self) {
        self.push_progress(Phase::Done, self.total_bytes, String::new());
        self.log(
            LogLevel::Info,
            &format!(
                "Parsing complete: {} messages, {} members",
                self.summary.message_count, self.summary.member_count
            ),
        );
        if let Some(skipped) = self.summary.skipped_description() {
            self.log(LogLevel::Info, &format!("Skipped: {skipped}"));
        }
        self.pending.push_back(IngestEvent::Done(self.summary.clone()));
        self.stage = Stage::Finished;
    }
}

impl Iterator for Ingestion {
    type Item = IngestEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.stage {
                Stage::Start => self.start(),
                Stage::Streaming => self.pump(),
                Stage::Members => self.emit_members(),
                Stage::Messages => self.emit_batch(),
                Stage::Finishing => self.finish(),
                Stage::Finished => return None,
            }
        }
    }
}

impl std::iter::FusedIterator for Ingestion {}

/// Directory holding the descriptor, `.` for a bare file name.
fn bundle_dir(descriptor_path: &Path) -> PathBuf {
    descriptor_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
