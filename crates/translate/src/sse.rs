//! Server-sent-event framing for the emitted Messages event stream.

use crate::messages::anthropic::StreamEvent;

/// Terminator payload of the upstream dialect: a final `data: [DONE]`
/// frame closing a Chat Completions stream. It carries no content and is
/// treated as a no-op by the consumer; the emitted Messages stream ends
/// with `message_stop` instead and never uses this sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Serialize one lifecycle event as an SSE frame:
/// `event: <name>\ndata: <compact-json>\n\n`.
///
/// Serialization of these types cannot realistically fail; if it ever
/// does, the frame degrades to an empty `data:` payload instead of
/// aborting a stream the caller has already started consuming.
pub fn format_event(event: &StreamEvent) -> String {
    let data = serde_json::to_string(event).unwrap_or_default();
    format!("event: {}\ndata: {}\n\n", event.name(), data)
}
