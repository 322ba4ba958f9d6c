//! Reader configuration.

/// What to do with a line that is not valid JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop reading and report [`NdjsonError::Json`](crate::NdjsonError::Json).
    #[default]
    Abort,
    /// Log a warning and drop the line.
    Skip,
}

/// What to do with a line that is not valid UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Utf8Policy {
    /// Stop reading and report [`NdjsonError::Utf8`](crate::NdjsonError::Utf8).
    #[default]
    Fail,
    /// Substitute U+FFFD for invalid sequences and keep going.
    Replace,
}

/// Options for [`NdjsonReader`](crate::NdjsonReader) and the stream adapters.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    /// Policy for lines that fail to parse.
    pub on_malformed: MalformedPolicy,
    /// Policy for lines that fail to decode.
    pub on_invalid_utf8: Utf8Policy,
    /// Upper bound on a pending line, in bytes. `None` means unbounded.
    pub max_line_len: Option<usize>,
}

impl ReaderOptions {
    /// Defaults: abort on malformed JSON, fail on invalid UTF-8, no line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the malformed-line policy.
    #[must_use]
    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Set the invalid-UTF-8 policy.
    #[must_use]
    pub fn on_invalid_utf8(mut self, policy: Utf8Policy) -> Self {
        self.on_invalid_utf8 = policy;
        self
    }

    /// Bound the length of a single pending line.
    #[must_use]
    pub fn max_line_len(mut self, limit: usize) -> Self {
        self.max_line_len = Some(limit);
        self
    }
}
