//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! A streamed Chat Completions body is a sequence of text lines.  Only lines of
//! the form `data: <payload>` matter; everything else (blank keep-alives,
//! `event:`/`id:` fields, comments) is ignored.  A payload of `[DONE]` ends the
//! stream.  Any other payload is decoded as a [`ChatCompletionChunk`]; a payload
//! that does not decode is reported as [`SseEvent::Malformed`] rather than as an
//! error so that one bad chunk does not cost the whole reply.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::STREAM_BYTES;
use crate::types::ChatCompletionChunk;
use crate::{Error, Result};

/// Prefix of the only SSE field the reader acts on.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A decoded `data:` line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// A well-formed chunk with at least one choice.
    Chunk(ChatCompletionChunk),
    /// A payload that was not valid JSON, lacked `choices`, or had none.
    Malformed(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Decode one line of the body.
///
/// Returns `None` for lines the reader ignores.
pub fn decode_line(line: &str) -> Option<SseEvent> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?;
    if payload == DONE_SENTINEL {
        return Some(SseEvent::Done);
    }
    let event = match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) if chunk.has_choices() => SseEvent::Chunk(chunk),
        Ok(_) => SseEvent::Malformed("chunk has no choices".to_string()),
        Err(err) => SseEvent::Malformed(format!("undecodable chunk: {err}")),
    };
    Some(event)
}

/// Process a stream of bytes into a stream of decoded `data:` events.
///
/// Lines are reassembled across network reads before decoding, so a multi-byte
/// character split between two reads is not a problem.  The stream ends after
/// yielding [`SseEvent::Done`] or when the body ends, whichever comes first.  A
/// final line without a trailing newline is still decoded.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<SseEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    decode_stream(byte_stream, None)
}

/// Like [`process_sse`], but fail with a timeout error when no bytes arrive for
/// `read_timeout`.
///
/// The limit applies to each read, not to the whole body, so a long reply that
/// keeps producing data is never cut off.
pub fn process_sse_with_read_timeout<S, E>(
    byte_stream: S,
    endpoint: impl Into<String>,
    read_timeout: Duration,
) -> impl Stream<Item = Result<SseEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    decode_stream(byte_stream, Some(ReadLimit {
        endpoint: endpoint.into(),
        duration: read_timeout,
    }))
}

struct ReadLimit {
    endpoint: String,
    duration: Duration,
}

struct DecodeState<S> {
    stream: S,
    buffer: Vec<u8>,
    finished: bool,
    limit: Option<ReadLimit>,
}

fn decode_stream<S, E>(byte_stream: S, limit: Option<ReadLimit>) -> impl Stream<Item = Result<SseEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });
    let state = DecodeState {
        stream,
        buffer: Vec::new(),
        finished: false,
        limit,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            // First drain any complete line already buffered
            if let Some(line) = take_line(&mut state.buffer) {
                match decode_bytes(&line) {
                    Some(SseEvent::Done) => {
                        state.finished = true;
                        return Some((Ok(SseEvent::Done), state));
                    }
                    Some(event) => return Some((Ok(event), state)),
                    None => continue,
                }
            }

            let next = match &state.limit {
                Some(limit) => {
                    match tokio::time::timeout(limit.duration, state.stream.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            let err = Error::timeout(
                                limit.endpoint.clone(),
                                format!(
                                    "no data received for {:.1} seconds while streaming",
                                    limit.duration.as_secs_f64()
                                ),
                                Some(limit.duration),
                            );
                            state.finished = true;
                            return Some((Err(err), state));
                        }
                    }
                }
                None => state.stream.next().await,
            };

            match next {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    // End of body; the last line may lack its newline
                    state.finished = true;
                    let rest = std::mem::take(&mut state.buffer);
                    return decode_bytes(&rest).map(|event| (Ok(event), state));
                }
            }
        }
    })
}

fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let newline = buffer.iter().position(|b| *b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=newline).collect();
    line.pop();
    Some(line)
}

fn decode_bytes(line: &[u8]) -> Option<SseEvent> {
    match std::str::from_utf8(line) {
        Ok(text) => decode_line(text),
        Err(err) => {
            // Only a data line is worth reporting
            if line.starts_with(DATA_PREFIX.as_bytes()) {
                Some(SseEvent::Malformed(format!("invalid UTF-8 in chunk: {err}")))
            } else {
                None
            }
        }
    }
}
