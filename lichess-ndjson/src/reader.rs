//! The incremental line reader.
//!
//! [`NdjsonReader`] is a push-driven state machine: hand it [`Chunk`]s in
//! arrival order and it returns every record that a chunk completes. The only
//! state carried between chunks is the pending tail of the current line.
//!
//! Lines are split on the raw byte `\n` before decoding. A UTF-8 multi-byte
//! sequence never contains that byte, so a character cut in half by a chunk
//! boundary simply waits in the pending tail until the rest arrives.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::NdjsonError;
use crate::options::{MalformedPolicy, ReaderOptions, Utf8Policy};

/// One delivery from a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// More bytes, of any length (possibly empty).
    Data(Bytes),
    /// The source has no more bytes.
    End,
}

impl Chunk {
    /// Whether this is the end-of-stream marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Self::Data(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Data(Bytes::from(bytes))
    }
}

impl From<&'static str> for Chunk {
    fn from(text: &'static str) -> Self {
        Self::Data(Bytes::from_static(text.as_bytes()))
    }
}

/// Lifecycle of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Accepting chunks.
    Reading,
    /// End of stream seen (or a fatal error). Terminal.
    Done,
}

/// Splits a chunked byte stream into newline-delimited JSON records of type `T`.
///
/// Use `serde_json::Value` for untyped records, or any `DeserializeOwned` type
/// to validate the record shape as each line is parsed.
///
/// ```
/// use lichess_ndjson::{Chunk, NdjsonReader};
///
/// let mut reader = NdjsonReader::<serde_json::Value>::new();
/// assert!(reader.push(Chunk::from("{\"a\"")).unwrap().is_empty());
/// let records = reader.push(Chunk::from(":1}\n{\"b\":2}")).unwrap();
/// assert_eq!(records, vec![serde_json::json!({"a": 1})]);
/// let last = reader.push(Chunk::End).unwrap();
/// assert_eq!(last, vec![serde_json::json!({"b": 2})]);
/// ```
pub struct NdjsonReader<T> {
    /// Bytes of the current, not yet terminated line.
    pending: Vec<u8>,
    /// Prefix of `pending` already known to contain no newline.
    scanned: usize,
    /// 1-based number of the line held in `pending`.
    line: usize,
    state: ReaderState,
    options: ReaderOptions,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> NdjsonReader<T> {
    /// Create a reader with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ReaderOptions::default())
    }

    /// Create a reader with the given options.
    #[must_use]
    pub fn with_options(options: ReaderOptions) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            line: 1,
            state: ReaderState::Reading,
            options,
            _record: PhantomData,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// 1-based number of the line that will be completed next.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Number of bytes waiting for a newline.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Push one chunk and return the records it completed, in stream order.
    ///
    /// On error, records completed earlier in the same chunk are lost; use
    /// [`NdjsonReader::push_into`] to keep them.
    pub fn push(&mut self, chunk: Chunk) -> Result<Vec<T>, NdjsonError> {
        let mut records = Vec::new();
        self.push_into(chunk, &mut records)?;
        Ok(records)
    }

    /// Shorthand for pushing a [`Chunk::Data`] chunk.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<T>, NdjsonError> {
        let mut records = Vec::new();
        self.push_into(Chunk::Data(Bytes::copy_from_slice(bytes)), &mut records)?;
        Ok(records)
    }

    /// Shorthand for pushing [`Chunk::End`]; returns the trailing record, if any.
    pub fn finish(&mut self) -> Result<Option<T>, NdjsonError> {
        let mut records = Vec::new();
        self.push_into(Chunk::End, &mut records)?;
        Ok(records.pop())
    }

    /// Push one chunk, appending completed records to `out`.
    ///
    /// Records completed before an error stay in `out`. Any error other than
    /// [`NdjsonError::Finished`] moves the reader to [`ReaderState::Done`].
    pub fn push_into(&mut self, chunk: Chunk, out: &mut Vec<T>) -> Result<(), NdjsonError> {
        if self.state == ReaderState::Done {
            return Err(NdjsonError::Finished);
        }
        let result = match chunk {
            Chunk::Data(bytes) => self.extend(&bytes, out),
            Chunk::End => self.flush(out),
        };
        if result.is_err() {
            self.state = ReaderState::Done;
            self.pending.clear();
            self.scanned = 0;
        }
        result
    }

    fn extend(&mut self, bytes: &[u8], out: &mut Vec<T>) -> Result<(), NdjsonError> {
        self.pending.extend_from_slice(bytes);

        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            self.check_len(end - consumed)?;
            let line = &self.pending[consumed..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if let Some(record) = decode_line(line, self.line, &self.options)? {
                out.push(record);
            }
            self.line += 1;
            consumed = end + 1;
            search_from = consumed;
        }

        self.pending.drain(..consumed);
        self.scanned = self.pending.len();
        self.check_len(self.pending.len())
    }

    /// Enforce `max_line_len` on the current line, complete or not.
    fn check_len(&self, len: usize) -> Result<(), NdjsonError> {
        match self.options.max_line_len {
            Some(limit) if len > limit => Err(NdjsonError::LineTooLong {
                line: self.line,
                limit,
            }),
            _ => Ok(()),
        }
    }

    fn flush(&mut self, out: &mut Vec<T>) -> Result<(), NdjsonError> {
        self.state = ReaderState::Done;
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        if rest.is_empty() {
            return Ok(());
        }

        tracing::trace!(line = self.line, bytes = rest.len(), "flushing unterminated final line");
        let record = decode_line(&rest, self.line, &self.options)?;
        self.line += 1;
        out.extend(record);
        Ok(())
    }
}

impl<T: DeserializeOwned> Default for NdjsonReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NdjsonReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdjsonReader")
            .field("pending_len", &self.pending.len())
            .field("line", &self.line)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish()
    }
}

/// Decode and parse one line. Blank lines yield `Ok(None)`.
fn decode_line<T: DeserializeOwned>(
    bytes: &[u8],
    line: usize,
    options: &ReaderOptions,
) -> Result<Option<T>, NdjsonError> {
    let decoded = match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(source) => match options.on_invalid_utf8 {
            Utf8Policy::Fail => return Err(NdjsonError::Utf8 { line, source }),
            Utf8Policy::Replace => String::from_utf8_lossy(bytes),
        },
    };

    let text = decoded.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(text) {
        Ok(record) => Ok(Some(record)),
        Err(source) => match options.on_malformed {
            MalformedPolicy::Abort => Err(NdjsonError::json(line, text, source)),
            MalformedPolicy::Skip => {
                tracing::warn!(line, error = %source, "skipping malformed NDJSON line");
                Ok(None)
            }
        },
    }
}
