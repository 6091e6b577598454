//! Folds decoded stream events into a complete reply while passing fragments through.
//!
//! Emitting a fragment and building the final message are separate effects:
//! [`StreamAccumulator`] only folds, and [`drain`] drives the fold and hands each
//! fragment to the renderer (and logger) as soon as it is folded in.

use std::time::Instant;

use futures::{Stream, StreamExt};

use crate::client_logger::ClientLogger;
use crate::interrupt::INTERRUPTED;
use crate::observability::{STREAM_DURATION, STREAM_FRAGMENTS, STREAM_SKIPPED_CHUNKS};
use crate::render::Renderer;
use crate::sse::SseEvent;
use crate::types::Message;
use crate::{Error, Result};

/// The assistant reply produced by one request, streamed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The assembled assistant message.
    pub message: Message,
    /// Malformed chunks that were skipped while streaming; always 0 otherwise.
    pub skipped_chunks: u64,
}

impl Reply {
    /// Wrap a message that arrived in one piece.
    pub fn complete(message: Message) -> Self {
        Self {
            message,
            skipped_chunks: 0,
        }
    }

    /// The reply text.
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Consume the reply, keeping only its text.
    pub fn into_content(self) -> String {
        self.message.content
    }
}

/// Accumulates [`SseEvent`]s into the assistant's reply.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    fragments: u64,
    skipped: u64,
    done: bool,
}

impl StreamAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in.
    ///
    /// Returns the fragment the caller should emit, if the event carried a
    /// non-empty one.  Malformed chunks bump the skip counter and are otherwise
    /// ignored.
    pub fn apply(&mut self, event: SseEvent) -> Option<String> {
        match event {
            SseEvent::Chunk(chunk) => {
                let fragment = chunk.fragment().filter(|f| !f.is_empty())?.to_string();
                self.content.push_str(&fragment);
                self.fragments += 1;
                Some(fragment)
            }
            SseEvent::Malformed(_) => {
                self.skipped += 1;
                None
            }
            SseEvent::Done => {
                self.done = true;
                None
            }
        }
    }

    /// Returns true once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of fragments folded in so far.
    pub fn fragment_count(&self) -> u64 {
        self.fragments
    }

    /// Number of malformed chunks skipped so far.
    pub fn skipped_chunks(&self) -> u64 {
        self.skipped
    }

    /// The text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Finish the fold, wrapping the text as an assistant message.
    pub fn finish(self) -> Reply {
        Reply {
            message: Message::assistant(self.content),
            skipped_chunks: self.skipped,
        }
    }
}

/// Drain `events` into a [`Reply`], emitting each fragment as it arrives.
///
/// The reply is only returned after the sentinel or the end of the body.  The
/// renderer is asked for an interrupt between events, and each wait for the
/// next event races the renderer's [`Interrupt`](crate::interrupt::Interrupt).
/// On interrupt the stream is dropped (closing the connection) and an abort
/// error is returned so that nothing half-finished escapes.
///
/// # Errors
///
/// Returns the first transport error raised by the stream, or an abort error
/// when interrupted.
pub async fn drain<S>(
    events: S,
    renderer: &mut dyn Renderer,
    logger: Option<&dyn ClientLogger>,
) -> Result<Reply>
where
    S: Stream<Item = Result<SseEvent>>,
{
    let started = Instant::now();
    let mut accumulator = StreamAccumulator::new();
    let interrupt = renderer.interrupt();
    futures::pin_mut!(events);

    renderer.start_response();
    loop {
        if renderer.should_interrupt() {
            renderer.print_interrupted();
            return Err(Error::abort(INTERRUPTED));
        }
        let next = match &interrupt {
            Some(interrupt) => tokio::select! {
                biased;
                () = interrupt.triggered() => None,
                next = events.next() => Some(next),
            },
            None => Some(events.next().await),
        };
        let Some(next) = next else {
            renderer.print_interrupted();
            return Err(Error::abort(INTERRUPTED));
        };
        let Some(event) = next else {
            break;
        };
        let event = event?;
        if matches!(event, SseEvent::Malformed(_)) {
            STREAM_SKIPPED_CHUNKS.click();
        }
        if let Some(fragment) = accumulator.apply(event) {
            STREAM_FRAGMENTS.click();
            renderer.print_text(&fragment);
            if let Some(logger) = logger {
                logger.log_stream_fragment(&fragment);
            }
        }
        if accumulator.is_done() {
            break;
        }
    }
    renderer.finish_response();
    STREAM_DURATION.add(started.elapsed().as_secs_f64());

    let reply = accumulator.finish();
    if let Some(logger) = logger {
        logger.log_stream_message(&reply.message, reply.skipped_chunks);
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CollectingRenderer;
    use crate::sse::decode_line;
    use crate::interrupt::Interrupt;
    use futures::stream;
    use std::time::Duration;

    fn events(lines: &[&str]) -> Vec<Result<SseEvent>> {
        lines.iter().filter_map(|l| decode_line(l)).map(Ok).collect()
    }

    #[tokio::test]
    async fn fragments_emitted_in_order() {
        let events = events(&[
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "data: [DONE]",
        ]);
        let mut renderer = CollectingRenderer::new();
        let reply = drain(stream::iter(events), &mut renderer, None)
            .await
            .unwrap();
        assert_eq!(reply.message, Message::assistant("Hello"));
        assert_eq!(reply.skipped_chunks, 0);
        assert_eq!(renderer.fragments, vec!["Hel", "lo"]);
        assert_eq!(renderer.responses, 1);
    }

    #[tokio::test]
    async fn malformed_chunk_is_skipped() {
        let events = events(&[
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            "data: {not json",
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "data: [DONE]",
        ]);
        let mut renderer = CollectingRenderer::new();
        let reply = drain(stream::iter(events), &mut renderer, None)
            .await
            .unwrap();
        assert_eq!(reply.content(), "Hello");
        assert_eq!(reply.skipped_chunks, 1);
        assert_eq!(renderer.fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn empty_and_role_only_chunks_emit_nothing() {
        let events = events(&[
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"ok"}}]}"#,
            r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        ]);
        let mut renderer = CollectingRenderer::new();
        let reply = drain(stream::iter(events), &mut renderer, None)
            .await
            .unwrap();
        assert_eq!(reply.content(), "ok");
        assert_eq!(reply.skipped_chunks, 0);
        assert_eq!(renderer.fragments, vec!["ok"]);
    }

    #[tokio::test]
    async fn body_end_without_sentinel_still_completes() {
        let events = events(&[r#"data: {"choices":[{"delta":{"content":"partial"}}]}"#]);
        let mut renderer = CollectingRenderer::new();
        let reply = drain(stream::iter(events), &mut renderer, None)
            .await
            .unwrap();
        assert_eq!(reply.content(), "partial");
    }

    #[tokio::test]
    async fn transport_error_aborts_fold() {
        let mut items = events(&[r#"data: {"choices":[{"delta":{"content":"a"}}]}"#]);
        items.push(Err(Error::streaming("connection reset", None)));
        let mut renderer = CollectingRenderer::new();
        let err = drain(stream::iter(items), &mut renderer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Streaming { .. }));
        assert_eq!(renderer.responses, 0);
    }

    #[tokio::test]
    async fn interrupt_stops_between_fragments() {
        let events = events(&[
            r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
            "data: [DONE]",
        ]);
        let mut renderer = CollectingRenderer::interrupt_after(1);
        let err = drain(stream::iter(events), &mut renderer, None)
            .await
            .unwrap_err();
        assert!(err.is_abort());
        assert!(renderer.interrupted);
        assert_eq!(renderer.fragments, vec!["a"]);
    }

    #[tokio::test]
    async fn interrupt_cuts_a_silent_stream() {
        let first = events(&[r#"data: {"choices":[{"delta":{"content":"a"}}]}"#]);
        let silent = stream::iter(first).chain(stream::pending());
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.trigger();
        });
        let mut renderer = CollectingRenderer::new().with_interrupt(interrupt);
        let err = tokio::time::timeout(Duration::from_secs(5), drain(silent, &mut renderer, None))
            .await
            .expect("interrupt must end the wait")
            .unwrap_err();
        assert!(err.is_abort());
        assert!(renderer.interrupted);
        assert_eq!(renderer.fragments, vec!["a"]);
    }

    #[test]
    fn accumulator_counts() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.apply(SseEvent::Malformed("x".to_string())), None);
        assert_eq!(
            acc.apply(decode_line(r#"data: {"choices":[{"delta":{"content":"x"}}]}"#).unwrap()),
            Some("x".to_string())
        );
        assert_eq!(acc.apply(SseEvent::Done), None);
        assert!(acc.is_done());
        assert_eq!(acc.fragment_count(), 1);
        assert_eq!(acc.skipped_chunks(), 1);
        assert_eq!(acc.content(), "x");
    }
}
