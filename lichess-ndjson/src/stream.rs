//! Async adapters from byte streams to record streams.
//!
//! Three ways to consume the same reader:
//!
//! - [`records`]: a pull-driven `Stream` of records; the next chunk is only
//!   requested when the consumer polls, so backpressure is implicit.
//! - [`read_stream`]: drives the stream to completion, awaiting the callback
//!   for each record before reading the next chunk.
//! - [`spawn_reader`]: reads on a spawned task into a bounded channel.

use std::future::Future;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, NdjsonError};
use crate::options::ReaderOptions;
use crate::reader::{Chunk, NdjsonReader};

/// Parse a byte stream into a stream of records with default options.
///
/// The stream ends after the last record, or right after the first error.
/// When the source fails, the unterminated tail is still parsed first: a
/// complete record there is yielded before [`NdjsonError::Source`], and a
/// truncated one is reported as [`NdjsonError::Json`] instead.
pub fn records<T, S, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<T, NdjsonError>> + Send + 'static
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    records_with_options(byte_stream, ReaderOptions::default())
}

/// Parse a byte stream into a stream of records.
pub fn records_with_options<T, S, E>(
    byte_stream: S,
    options: ReaderOptions,
) -> impl Stream<Item = Result<T, NdjsonError>> + Send + 'static
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    async_stream::stream! {
        let mut reader = NdjsonReader::<T>::with_options(options);
        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut batch = Vec::new();

        loop {
            let chunk = match byte_stream.next().await {
                Some(Ok(bytes)) => Chunk::Data(bytes),
                Some(Err(e)) => {
                    let source: BoxError = e.into();
                    let flushed = flush_after_failure(&mut reader, &mut batch, &source);
                    for record in batch.drain(..) {
                        yield Ok(record);
                    }
                    yield Err(flushed.err().unwrap_or(NdjsonError::Source(source)));
                    return;
                }
                None => Chunk::End,
            };
            let at_end = chunk.is_end();

            let result = reader.push_into(chunk, &mut batch);
            for record in batch.drain(..) {
                yield Ok(record);
            }
            if let Err(e) = result {
                yield Err(e);
                return;
            }
            if at_end {
                return;
            }
        }
    }
}

/// Drive a byte stream to completion, handing each record to `process`.
///
/// Each callback future is awaited before the next chunk is requested, so
/// records are processed strictly in order and never overlap. The
/// cancellation token is checked before every read and also interrupts a
/// read that is still waiting for bytes.
///
/// Returns the number of records delivered.
pub async fn read_stream<T, S, E, F, Fut, CE>(
    byte_stream: S,
    cancel: &CancellationToken,
    process: F,
) -> Result<usize, NdjsonError>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), CE>>,
    CE: Into<BoxError>,
{
    read_stream_with_options(byte_stream, cancel, ReaderOptions::default(), process).await
}

/// [`read_stream`] with explicit reader options.
pub async fn read_stream_with_options<T, S, E, F, Fut, CE>(
    byte_stream: S,
    cancel: &CancellationToken,
    options: ReaderOptions,
    mut process: F,
) -> Result<usize, NdjsonError>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), CE>>,
    CE: Into<BoxError>,
{
    let mut reader = NdjsonReader::<T>::with_options(options);
    let mut byte_stream = std::pin::pin!(byte_stream);
    let mut batch = Vec::new();
    let mut delivered = 0;

    loop {
        // Biased so an already-cancelled token wins over a ready chunk.
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(NdjsonError::Cancelled),
            next = byte_stream.next() => next,
        };
        let chunk = match next {
            Some(Ok(bytes)) => Chunk::Data(bytes),
            Some(Err(e)) => {
                let source: BoxError = e.into();
                let flushed = flush_after_failure(&mut reader, &mut batch, &source);
                for record in batch.drain(..) {
                    process(record)
                        .await
                        .map_err(|e| NdjsonError::Callback(e.into()))?;
                }
                flushed?;
                return Err(NdjsonError::Source(source));
            }
            None => Chunk::End,
        };
        let at_end = chunk.is_end();

        let result = reader.push_into(chunk, &mut batch);
        for record in batch.drain(..) {
            process(record)
                .await
                .map_err(|e| NdjsonError::Callback(e.into()))?;
            delivered += 1;
        }
        result?;

        if at_end {
            tracing::debug!(records = delivered, "NDJSON stream complete");
            return Ok(delivered);
        }
    }
}

/// Parse whatever the reader still holds once the source has failed.
fn flush_after_failure<T: DeserializeOwned>(
    reader: &mut NdjsonReader<T>,
    batch: &mut Vec<T>,
    source: &BoxError,
) -> Result<(), NdjsonError> {
    if reader.pending_len() > 0 {
        tracing::warn!(
            line = reader.line_number(),
            error = %source,
            "byte source failed, parsing unterminated final line"
        );
    }
    reader.push_into(Chunk::End, batch)
}

/// Read records on a spawned task into a bounded channel of `capacity` items.
///
/// When the channel is full the task stops reading until the consumer catches
/// up. The task exits after the last record, after forwarding the first
/// error, when `cancel` fires (forwarding [`NdjsonError::Cancelled`]), or when
/// the receiver is dropped. Must be called inside a Tokio runtime.
pub fn spawn_reader<T, S, E>(
    byte_stream: S,
    capacity: usize,
    options: ReaderOptions,
    cancel: CancellationToken,
) -> mpsc::Receiver<Result<T, NdjsonError>>
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let mut records = std::pin::pin!(records_with_options::<T, S, E>(byte_stream, options));
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => Some(Err(NdjsonError::Cancelled)),
                next = records.next() => next,
            };
            let Some(item) = next else {
                break;
            };
            let stop = item.is_err();
            if tx.send(item).await.is_err() {
                tracing::debug!("record receiver dropped, stopping reader");
                break;
            }
            if stop {
                break;
            }
        }
    });

    rx
}
