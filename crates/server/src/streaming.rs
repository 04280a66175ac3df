//! Producer side of a streamed exchange.
//!
//! A spawned task reads the upstream SSE byte stream, drives the
//! [`StreamTranslator`] state machine, and writes translated SSE frames
//! into an in-memory pipe whose read end becomes the response body. The
//! task is the sole writer. When the client goes away the pipe send fails
//! and the task stops, which drops (and thereby closes) the upstream
//! stream. The finalization sequence runs on every exit path, so the
//! emitted lifecycle is well-formed even when the upstream ends early.

use std::{convert::Infallible, fmt::Display, pin::pin, sync::Arc};

use axum::body::{Body, Bytes};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use translate::{StreamTranslator, messages::anthropic::StreamEvent, messages::openai::ChatChunk, sse};

use crate::audit::AuditLog;

/// Frames buffered in the pipe before the producer suspends on the writer
/// side.
const PIPE_DEPTH: usize = 32;

/// Translate an upstream Chat Completions SSE byte stream into a Messages
/// event-stream body.
///
/// The returned [`Body`] yields translated bytes as they are produced.
/// The spawned producer owns the audit capture and flushes the session
/// when the exchange ends.
pub(crate) fn translate_stream<S, E>(upstream: S, model: String, audit: Arc<AuditLog>, request_id: String) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Bytes>(PIPE_DEPTH);

    tokio::spawn(pump(upstream, model, audit, request_id, tx));

    Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>))
}

async fn pump<S, E>(upstream: S, model: String, audit: Arc<AuditLog>, request_id: String, tx: mpsc::Sender<Bytes>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut translator = StreamTranslator::new(model);
    let mut capture = audit.captures_stream().then(String::new);
    let mut frames = pin!(upstream.eventsource());

    let mut reader_open = forward(&tx, &mut capture, &translator.start()).await;

    while reader_open && let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                log::warn!("Skipping malformed SSE frame from upstream: {error}");
                continue;
            }
        };

        // Terminator frame; any further frames would still be translated.
        if frame.data == sse::DONE_SENTINEL {
            continue;
        }

        let Ok(chunk) = serde_json::from_str::<ChatChunk>(&frame.data) else {
            log::warn!("Skipping unparseable upstream stream chunk");
            continue;
        };

        for event in translator.on_chunk(chunk) {
            if !forward(&tx, &mut capture, &event).await {
                reader_open = false;
                break;
            }
        }
    }

    // Runs from whatever state the loop exited in; sends fail silently
    // once the reader is gone but the audit capture still completes.
    for event in translator.finish() {
        if !forward(&tx, &mut capture, &event).await {
            break;
        }
    }

    if let Some(capture) = capture {
        audit.record_stream_data(&request_id, capture);
    }

    audit.end_session(&request_id).await;
}

/// Frame, capture, and send one event. Returns false when the read end of
/// the pipe is gone.
async fn forward(tx: &mpsc::Sender<Bytes>, capture: &mut Option<String>, event: &StreamEvent) -> bool {
    let frame = sse::format_event(event);

    if let Some(buffer) = capture.as_mut() {
        buffer.push_str(&frame);
    }

    tx.send(Bytes::from(frame)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, sync::Arc};

    use axum::body::Bytes;
    use config::DataLoggingConfig;
    use futures::stream;
    use tokio::sync::mpsc;

    use super::pump;
    use crate::audit::AuditLog;

    fn disabled_audit() -> Arc<AuditLog> {
        Arc::new(AuditLog::new(DataLoggingConfig::default()))
    }

    fn byte_stream(chunks: &[&str]) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        let owned: Vec<Result<Bytes, Infallible>> = chunks
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.to_string())))
            .collect();
        stream::iter(owned)
    }

    /// Run the pump to completion and return the emitted frames as one
    /// string.
    async fn run(chunks: &[&str]) -> String {
        let (tx, mut rx) = mpsc::channel(32);
        pump(
            byte_stream(chunks),
            "anthropic/claude-sonnet-4".to_string(),
            disabled_audit(),
            "req_test".to_string(),
            tx,
        )
        .await;

        let mut output = String::new();
        while let Some(bytes) = rx.recv().await {
            output.push_str(std::str::from_utf8(&bytes).unwrap());
        }
        output
    }

    fn event_names(output: &str) -> Vec<&str> {
        output
            .lines()
            .filter_map(|line| line.strip_prefix("event: "))
            .collect()
    }

    #[tokio::test]
    async fn tool_call_stream_end_to_end() {
        let output = run(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"t1\",\"function\":{\"name\":\"search\",\"arguments\":\"{\\\"q\\\":\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"cats\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":4}}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        assert_eq!(
            event_names(&output),
            [
                "message_start",
                "content_block_start",
                "content_block_delta",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );
        assert!(output.contains("\"partial_json\":\"{\\\"q\\\":\""));
        assert!(output.contains("\"stop_reason\":\"tool_use\""));
        assert!(output.contains("\"input_tokens\":10"));
    }

    #[tokio::test]
    async fn frames_split_across_reads_are_reassembled() {
        // One data: line delivered in three byte chunks must translate the
        // same as if delivered whole.
        let output = run(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"hel",
            "lo\"}}]}\n\ndata: [DONE]\n\n",
        ])
        .await;

        assert_eq!(
            event_names(&output),
            ["message_start", "content_block_start", "content_block_delta", "content_block_stop", "message_delta", "message_stop"]
        );
        assert!(output.contains("\"text\":\"hello\""));
    }

    #[tokio::test]
    async fn unparseable_chunks_are_skipped() {
        let output = run(&[
            "data: {not json}\n\n",
            ": comment frame\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ])
        .await;

        assert!(output.contains("\"text\":\"ok\""));
        assert_eq!(event_names(&output).len(), 6);
    }

    #[tokio::test]
    async fn upstream_ending_without_done_still_closes_the_lifecycle() {
        let output = run(&["data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n"]).await;

        let names = event_names(&output);
        assert_eq!(names.last(), Some(&"message_stop"));
        assert_eq!(names[names.len() - 2], "message_delta");
        assert!(output.contains("\"stop_reason\":\"end_turn\""));
    }

    #[tokio::test]
    async fn dropped_reader_stops_the_producer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        // Must terminate promptly instead of pumping into the void.
        pump(
            byte_stream(&["data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n"]),
            "m".to_string(),
            disabled_audit(),
            "req_gone".to_string(),
            tx,
        )
        .await;
    }

    #[tokio::test]
    async fn capture_is_flushed_to_the_audit_log() {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(DataLoggingConfig {
            enabled: true,
            directory: dir.path().to_path_buf(),
            ..DataLoggingConfig::default()
        }));
        audit.start_session("req_cap");

        let (tx, mut rx) = mpsc::channel(32);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        pump(
            byte_stream(&["data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n"]),
            "m".to_string(),
            audit,
            "req_cap".to_string(),
            tx,
        )
        .await;
        drain.await.unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let document: serde_json::Value = serde_json::from_slice(&std::fs::read(entry.path()).unwrap()).unwrap();

        assert_eq!(document["is_streaming"], true);
        let captured = document["stream_data"].as_str().unwrap();
        assert!(captured.starts_with("event: message_start\n"));
        assert!(captured.ends_with("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n"));
    }
}
