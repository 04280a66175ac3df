//! Incremental translation of a streamed Chat Completions response into
//! the Messages event lifecycle.
//!
//! The upstream dialect has no structural events: block boundaries have to
//! be inferred from the deltas themselves. [`StreamTranslator`] keeps a
//! small state machine that opens a text block on the first text delta,
//! opens a tool block whenever a tool-call delta carries a fresh id, and
//! closes the open block on every transition. [`StreamTranslator::finish`]
//! closes whatever is still open and emits the terminal `message_delta` /
//! `message_stop` pair, so the output lifecycle is well-formed no matter
//! where the input stream ends.

use std::collections::HashMap;

use jiff::Timestamp;
use serde_json::{Map, Value};

use crate::messages::{
    anthropic::{ContentBlock, ContentDelta, MessageDeltaBody, MessagesResponse, Role, StopReason, StreamEvent, Usage},
    openai::ChatChunk,
};

/// Single-pass, forward-only translator for one streamed exchange.
#[derive(Debug)]
pub struct StreamTranslator {
    message_id: String,
    model: String,
    content_block_index: u64,
    has_started_text_block: bool,
    is_tool_use: bool,
    current_tool_call_id: String,
    input_tokens: u64,
    output_tokens: u64,
    /// Accumulated argument fragments per call id, kept for bookkeeping;
    /// fragments are forwarded unparsed.
    tool_call_args: HashMap<String, String>,
}

impl StreamTranslator {
    /// A translator for a stream answering with the given model string.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            message_id: format!("msg_{}", Timestamp::now().as_millisecond()),
            model: model.into(),
            content_block_index: 0,
            has_started_text_block: false,
            is_tool_use: false,
            current_tool_call_id: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            tool_call_args: HashMap::new(),
        }
    }

    /// The generated `msg_<unix-millis>` identifier of this stream.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The `message_start` event opening the stream, to be emitted before
    /// any input is consumed.
    pub fn start(&self) -> StreamEvent {
        StreamEvent::MessageStart {
            message: MessagesResponse {
                id: self.message_id.clone(),
                r#type: "message".to_string(),
                role: Role::Assistant,
                content: Vec::new(),
                model: self.model.clone(),
                stop_reason: None,
                stop_sequence: None,
                usage: Usage::default(),
            },
        }
    }

    /// Translate one upstream frame into zero or more lifecycle events.
    pub fn on_chunk(&mut self, chunk: ChatChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        // Usage may ride on any frame, including a trailing one with an
        // empty choices array. Last writer wins.
        if let Some(usage) = chunk.usage {
            self.input_tokens = usage.prompt_tokens;
            self.output_tokens = usage.completion_tokens;
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        let delta = choice.delta;

        if let Some(tool_calls) = delta.tool_calls.filter(|calls| !calls.is_empty()) {
            for call in tool_calls {
                let id = call.id.unwrap_or_default();

                // A fresh id opens a new tool block; an empty or repeated id
                // continues the current one.
                if !id.is_empty() && id != self.current_tool_call_id {
                    self.close_open_block(&mut events);

                    self.is_tool_use = true;
                    self.has_started_text_block = false;
                    self.current_tool_call_id = id.clone();
                    self.tool_call_args.insert(id.clone(), String::new());

                    let name = call
                        .function
                        .as_ref()
                        .and_then(|function| function.name.clone())
                        .unwrap_or_default();

                    events.push(StreamEvent::ContentBlockStart {
                        index: self.content_block_index,
                        content_block: ContentBlock::ToolUse {
                            id,
                            name,
                            input: Some(Value::Object(Map::new())),
                        },
                    });
                }

                let fragment = call
                    .function
                    .and_then(|function| function.arguments)
                    .unwrap_or_default();

                if !fragment.is_empty() && !self.current_tool_call_id.is_empty() {
                    if let Some(args) = self.tool_call_args.get_mut(&self.current_tool_call_id) {
                        args.push_str(&fragment);
                    }

                    events.push(StreamEvent::ContentBlockDelta {
                        index: self.content_block_index,
                        delta: ContentDelta::InputJsonDelta { partial_json: fragment },
                    });
                }
            }
        } else if let Some(text) = delta.content.filter(|text| !text.is_empty()) {
            if self.is_tool_use {
                self.close_open_block(&mut events);
                self.current_tool_call_id.clear();
            }

            if !self.has_started_text_block {
                events.push(StreamEvent::ContentBlockStart {
                    index: self.content_block_index,
                    content_block: ContentBlock::Text { text: String::new() },
                });
                self.has_started_text_block = true;
            }

            events.push(StreamEvent::ContentBlockDelta {
                index: self.content_block_index,
                delta: ContentDelta::TextDelta { text },
            });
        }

        events
    }

    /// Close the stream: stop any open block, report the final stop reason
    /// and usage, and terminate.
    ///
    /// Runs from whatever state the translator is in, so the output stream
    /// is well-formed even when the upstream ended early.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        let stop_reason = if self.is_tool_use {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };

        if self.is_tool_use || self.has_started_text_block {
            events.push(StreamEvent::ContentBlockStop {
                index: self.content_block_index,
            });
            self.is_tool_use = false;
            self.has_started_text_block = false;
        }

        events.push(StreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason,
                stop_sequence: None,
            },
            usage: Usage {
                input_tokens: self.input_tokens,
                output_tokens: self.output_tokens,
            },
        });
        events.push(StreamEvent::MessageStop);

        events
    }

    /// Emit `content_block_stop` for the open block, if any, and advance
    /// the index. The first block of a stream therefore lands at index 0.
    fn close_open_block(&mut self, events: &mut Vec<StreamEvent>) {
        if self.is_tool_use || self.has_started_text_block {
            events.push(StreamEvent::ContentBlockStop {
                index: self.content_block_index,
            });
            self.content_block_index += 1;
            self.is_tool_use = false;
            self.has_started_text_block = false;
        }
    }
}
