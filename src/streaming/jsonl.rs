//! Line-at-a-time reader for chunk files.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::record::RawRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Forward-only iterator over the records of one chunk file.
///
/// Lines are read into a reused buffer and decoded one by one, so memory use is
/// bounded by the longest line rather than the file size. Blank lines are
/// ignored. Lines that don't decode are dropped and counted in
/// [`malformed_lines`](Self::malformed_lines).
///
/// A read error ends the iteration; it is kept for the caller in
/// [`take_error`](Self::take_error).
pub struct RecordStream<R: BufRead> {
    reader: R,
    line_buffer: Vec<u8>,
    bytes_read: u64,
    lines_read: u64,
    records_read: u64,
    malformed_lines: u64,
    error: Option<io::Error>,
    finished: bool,
}

impl RecordStream<BufReader<File>> {
    /// Opens a chunk file with a read buffer of `buffer_size` bytes.
    pub fn open(path: impl AsRef<Path>, buffer_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(buffer_size.max(1), file)))
    }
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: Vec::with_capacity(4096),
            bytes_read: 0,
            lines_read: 0,
            records_read: 0,
            malformed_lines: 0,
            error: None,
            finished: false,
        }
    }

    /// Bytes consumed from the underlying reader, including line terminators.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Physical lines consumed, blank and malformed ones included.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Records successfully decoded so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Non-blank lines that failed to decode.
    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }

    /// The I/O error that ended the stream early, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn decode_line(&mut self) -> Option<RawRecord> {
        let mut line = self.line_buffer.as_slice();
        if self.lines_read == 1 {
            line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
        }
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice::<RawRecord>(line) {
            Ok(record) => {
                self.records_read += 1;
                Some(record)
            }
            Err(e) => {
                self.malformed_lines += 1;
                tracing::debug!(line = self.lines_read, error = %e, "dropping malformed line");
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            self.line_buffer.clear();
            match self.reader.read_until(b'\n', &mut self.line_buffer) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(n) => {
                    self.bytes_read += n as u64;
                    self.lines_read += 1;
                    if let Some(record) = self.decode_line() {
                        return Some(record);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "chunk read failed");
                    self.error = Some(e);
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for RecordStream<R> {}
