#![deny(missing_docs)]
//! Incremental newline-delimited JSON (NDJSON) reading.
//!
//! Lichess streams list endpoints (studies, broadcast rounds, games) as one
//! JSON document per line:
//! ```text
//! {"id":"abcd1234","name":"Opening prep"}
//! {"id":"efgh5678","name":"Endgames"}
//! ```
//!
//! The body arrives as chunks of arbitrary size that ignore line and
//! character boundaries. This crate turns such a byte stream into records
//! without buffering the whole response:
//!
//! - [`NdjsonReader`] is the synchronous core. Push [`Chunk`]s, get records.
//! - [`records`] adapts a `Stream<Item = Result<Bytes, E>>` (for example
//!   `reqwest::Response::bytes_stream()`) into a `Stream` of records.
//! - [`read_stream`] drives a byte stream to completion through an async
//!   callback, with cancellation.
//! - [`spawn_reader`] reads on a background task into a bounded channel.
//!
//! Lines end with `\n` or `\r\n`. Blank lines are skipped. A final line with
//! no terminator is still parsed when the stream ends. By default the first
//! malformed line ends the stream with [`NdjsonError::Json`]; see
//! [`ReaderOptions`] for the lenient policies.

mod error;
mod options;
mod reader;
mod stream;

pub use error::{BoxError, NdjsonError};
pub use options::{MalformedPolicy, ReaderOptions, Utf8Policy};
pub use reader::{Chunk, NdjsonReader, ReaderState};
pub use stream::{
    read_stream, read_stream_with_options, records, records_with_options, spawn_reader,
};
