//! Error type for NDJSON reading.

/// Boxed error from a byte source or record callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Longest excerpt of an offending line kept in [`NdjsonError::Json`].
const EXCERPT_CHARS: usize = 120;

/// Errors from reading a newline-delimited JSON stream.
///
/// Every variant except [`NdjsonError::Finished`] ends the stream: the reader
/// stops and no further records are produced.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum NdjsonError {
    /// A line was not valid JSON (or did not match the expected record shape).
    #[error("malformed JSON on line {line}: {source} (near {content:?})")]
    Json {
        /// 1-based line number within the stream.
        line: usize,
        /// The offending line, truncated for display.
        content: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A line was not valid UTF-8.
    #[error("invalid UTF-8 on line {line}: {source}")]
    Utf8 {
        /// 1-based line number within the stream.
        line: usize,
        /// The underlying decode error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// A pending line grew past the configured limit without a newline.
    #[error("line {line} exceeds {limit} bytes without a newline")]
    LineTooLong {
        /// 1-based line number within the stream.
        line: usize,
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The underlying byte source failed.
    #[error("stream read error: {0}")]
    Source(#[source] BoxError),

    /// The per-record callback returned an error.
    #[error("record callback failed: {0}")]
    Callback(#[source] BoxError),

    /// Reading was cancelled through the cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// A chunk was pushed after the end of the stream.
    #[error("reader already finished")]
    Finished,
}

impl NdjsonError {
    pub(crate) fn json(line: usize, text: &str, source: serde_json::Error) -> Self {
        Self::Json {
            line,
            content: text.chars().take(EXCERPT_CHARS).collect(),
            source,
        }
    }

    /// The 1-based line number the error refers to, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Json { line, .. } | Self::Utf8 { line, .. } | Self::LineTooLong { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}
