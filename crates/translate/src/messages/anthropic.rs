use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body of the Messages API, the client-facing dialect.
///
/// The shape follows the [Anthropic Messages API](https://docs.anthropic.com/en/api/messages):
/// message content is either a plain string or an array of typed content
/// blocks, the system prompt lives outside the message list, and tool
/// interactions are expressed as `tool_use`/`tool_result` blocks rather
/// than a separate tool-call array. Unknown fields (`max_tokens`,
/// `metadata`, ...) are accepted and ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesRequest {
    /// The requested model. Rewritten through the configured model
    /// mappings unless it already carries a `/` namespace separator.
    pub model: String,

    /// The conversation, alternating `user` and `assistant` roles.
    pub messages: Vec<Message>,

    /// System prompt, either a single string or a list of text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,

    /// Sampling temperature, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Tools the model may invoke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// Whether the response should be streamed as Server-Sent Events.
    #[serde(default)]
    pub stream: bool,
}

/// System prompt in either of its two accepted shapes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    /// A bare string.
    Text(String),
    /// A list of `{"type": "text", "text": ...}` objects.
    Blocks(Vec<SystemBlock>),
}

/// One element of an array-form system prompt. Elements without a `text`
/// field are skipped during translation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemBlock {
    /// The system text.
    #[serde(default)]
    pub text: Option<String>,
}

/// A single conversation message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    /// Sender role. Roles other than `user` and `assistant` deserialize
    /// into [`Role::Other`] and are ignored by the request translator.
    pub role: Role,

    /// String content or a list of typed content parts.
    pub content: MessageContent,
}

/// Message sender role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
    /// Model output, including tool invocations.
    Assistant,
    /// Any role this dialect does not define.
    #[serde(untagged)]
    Other(String),
}

/// Message content container: the dialect allows both a plain string and
/// an ordered list of content parts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple string content.
    Text(String),
    /// Structured content parts.
    Parts(Vec<ContentPart>),
}

/// Typed content part of a request message.
///
/// Fields are individually defaulted so a structurally incomplete part
/// still parses; unknown part types collapse into [`ContentPart::Unknown`]
/// and are skipped rather than failing the whole request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        #[serde(default)]
        text: String,
    },

    /// A tool invocation recorded in assistant history.
    ToolUse {
        /// Identifier pairing this invocation with a later `tool_result`.
        #[serde(default)]
        id: String,
        /// Tool name.
        #[serde(default)]
        name: String,
        /// Free-form input object.
        #[serde(default)]
        input: Value,
    },

    /// The result of an earlier tool invocation, carried in a user message.
    ToolResult {
        /// Identifier of the `tool_use` this result answers.
        #[serde(default)]
        tool_use_id: String,
        /// Result payload: a string or any nested structured value.
        #[serde(default)]
        content: Value,
    },

    /// Unrecognized part types (images, documents, ...).
    #[serde(other)]
    Unknown,
}

/// Tool definition in the client dialect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool input.
    pub input_schema: Value,
}

/// Response body of the Messages API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesResponse {
    /// Generated identifier, `msg_<unix-millis>`.
    pub id: String,

    /// Always `"message"`.
    pub r#type: String,

    /// Always [`Role::Assistant`].
    pub role: Role,

    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,

    /// The model string echoed back to the caller.
    pub model: String,

    /// Why generation stopped. Unset only in the `message_start` skeleton
    /// of a streamed response.
    pub stop_reason: Option<StopReason>,

    /// Always null; the upstream dialect has no stop-sequence reporting.
    pub stop_sequence: Option<String>,

    /// Token accounting.
    pub usage: Usage,
}

/// Content block of an assistant response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },

    /// A tool invocation.
    ToolUse {
        /// Invocation identifier.
        id: String,
        /// Tool name.
        name: String,
        /// Parsed input object. Omitted entirely when the upstream
        /// argument string did not parse as JSON, which is distinguishable
        /// from an empty object.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the assistant turn.
    EndTurn,
    /// The model invoked one or more tools.
    ToolUse,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::ToolUse => write!(f, "tool_use"),
        }
    }
}

/// Token usage in the client dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens generated by the model.
    pub output_tokens: u64,
}

/// Server-sent event surface of a streamed Messages response.
///
/// A well-formed stream is exactly: one `message_start`, zero or more
/// balanced `content_block_start`/`content_block_delta`/`content_block_stop`
/// groups with strictly increasing indices from 0, one `message_delta`,
/// one `message_stop`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Announces the streamed message with an empty response skeleton.
    MessageStart {
        /// The skeleton: id, model, empty content, zeroed usage.
        message: MessagesResponse,
    },

    /// Opens the content block at `index`.
    ContentBlockStart {
        /// Block index.
        index: u64,
        /// The opened block: empty text, or a tool invocation with an
        /// empty input object.
        content_block: ContentBlock,
    },

    /// Incremental payload for the open block at `index`.
    ContentBlockDelta {
        /// Block index.
        index: u64,
        /// The increment.
        delta: ContentDelta,
    },

    /// Closes the content block at `index`.
    ContentBlockStop {
        /// Block index.
        index: u64,
    },

    /// Final stop reason and usage, emitted immediately before
    /// `message_stop`.
    MessageDelta {
        /// Stop reason and (always-null) stop sequence.
        delta: MessageDeltaBody,
        /// Final token accounting.
        usage: Usage,
    },

    /// Terminates the stream.
    MessageStop,
}

impl StreamEvent {
    /// The SSE `event:` name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
        }
    }
}

/// Incremental content carried by a `content_block_delta` event.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    /// A text fragment to append.
    TextDelta {
        /// The fragment.
        text: String,
    },

    /// A fragment of the JSON-encoded tool input. The consumer rebuilds
    /// the full input by concatenating fragments in order.
    InputJsonDelta {
        /// The fragment, not necessarily valid JSON on its own.
        partial_json: String,
    },
}

/// Payload of a `message_delta` event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageDeltaBody {
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Always serialized, always null.
    pub stop_sequence: Option<String>,
}
