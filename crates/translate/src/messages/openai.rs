use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the upstream Chat Completions endpoint.
///
/// Unlike the client dialect, message content here is flat: system prompts
/// are ordinary `system`-role messages, tool invocations live in a sibling
/// `tool_calls` array with JSON-encoded argument strings, and tool results
/// are standalone `tool`-role messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Fully-qualified upstream model identifier.
    pub model: String,

    /// System prefix followed by the translated conversation.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Whether the upstream should stream the response.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,

    /// Tool catalog in the nested `{type, function}` shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

/// A single Chat Completions message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    /// Sender role.
    pub role: ChatRole,

    /// Message content, absent for assistant messages that only carry
    /// tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatContent>,

    /// Tool invocations attached to an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// For `tool`-role messages, the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Chat Completions message role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool execution result.
    Tool,
}

/// Content of an outgoing Chat Completions message.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Flat text, used for user and assistant messages.
    Text(String),
    /// Structured text parts, used for system messages so the cache hint
    /// can ride along.
    Blocks(Vec<TextPart>),
    /// Verbatim passthrough of a structured tool result.
    Json(Value),
}

/// A text part of a system message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextPart {
    /// Always `"text"`.
    pub r#type: String,

    /// The text content.
    pub text: String,

    /// Opaque prompt-cache hint, carried through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl TextPart {
    /// A plain text part, optionally carrying the ephemeral cache hint.
    pub fn new(text: String, cached: bool) -> Self {
        Self {
            r#type: "text".to_string(),
            text,
            cache_control: cached.then(CacheControl::ephemeral),
        }
    }
}

/// Prompt-cache hint attached to system content parts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheControl {
    /// Cache type, always `"ephemeral"`.
    pub r#type: String,
}

impl CacheControl {
    /// The `{"type": "ephemeral"}` hint.
    pub fn ephemeral() -> Self {
        Self {
            r#type: "ephemeral".to_string(),
        }
    }
}

/// A tool invocation on an assistant message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    /// Stable identifier linking the call to its `tool`-role answer.
    #[serde(default)]
    pub id: String,

    /// Always `"function"`.
    #[serde(default)]
    pub r#type: String,

    /// The invoked function and its arguments.
    #[serde(default)]
    pub function: FunctionCall,
}

impl ToolCall {
    /// A function-type tool call.
    pub fn function(id: String, name: String, arguments: String) -> Self {
        Self {
            id,
            r#type: "function".to_string(),
            function: FunctionCall { name, arguments },
        }
    }
}

/// Function name plus its JSON-encoded argument string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FunctionCall {
    /// Function name.
    #[serde(default)]
    pub name: String,

    /// Arguments as a JSON-encoded string, not a JSON object.
    #[serde(default)]
    pub arguments: String,
}

/// Tool catalog entry in the upstream dialect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDefinition {
    /// Always `"function"`.
    pub r#type: String,

    /// The function specification.
    pub function: FunctionDefinition,
}

/// Function specification inside a [`ToolDefinition`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// What the function does.
    pub description: String,
    /// JSON Schema of the parameters.
    pub parameters: Value,
}

/// Buffered Chat Completions response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    /// Upstream completion identifier, kept for the audit log.
    #[serde(default)]
    pub id: String,

    /// Model reported by the upstream, kept for the audit log.
    #[serde(default)]
    pub model: String,

    /// Completion candidates; only the first is inspected.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Token accounting, absent with some providers.
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

/// One completion candidate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatChoice {
    /// Candidate index.
    #[serde(default)]
    pub index: u64,

    /// The generated message.
    pub message: ChatResponseMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// The assistant message of a buffered completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponseMessage {
    /// Generated text, null when the model only called tools.
    #[serde(default)]
    pub content: Option<String>,

    /// Tool invocations, if any.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Upstream finish reason.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop.
    Stop,
    /// Token limit reached.
    Length,
    /// Content filtered.
    ContentFilter,
    /// The model called tools.
    ToolCalls,
    /// Anything this dialect does not define.
    #[serde(untagged)]
    Other(String),
}

/// Token accounting in the upstream dialect.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct ChatUsage {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens generated by the model.
    #[serde(default)]
    pub completion_tokens: u64,

    /// Sum of the two, accepted for audit fidelity but otherwise unused.
    #[serde(default)]
    pub total_tokens: u64,
}

/// One frame of a streamed Chat Completions response.
///
/// Some providers push a final frame with an empty `choices` array that
/// only carries `usage`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatChunk {
    /// Incremental candidates; only the first is inspected.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Token accounting, typically only on the final frame.
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

/// Incremental update for one candidate.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChunkChoice {
    /// Candidate index.
    #[serde(default)]
    pub index: u64,

    /// The increment.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Present on the candidate's final frame.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Any subset of the delta fields may be present in a frame.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChunkDelta {
    /// Role announcement, first frame only.
    #[serde(default)]
    pub role: Option<String>,

    /// Text fragment to append.
    #[serde(default)]
    pub content: Option<String>,

    /// Incremental tool-call updates, keyed by a stable `index`.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Incremental update for one tool call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolCallDelta {
    /// Stable position of this call within the message.
    #[serde(default)]
    pub index: u64,

    /// Call identifier, present when a new call starts.
    #[serde(default)]
    pub id: Option<String>,

    /// Call type, `"function"` when present.
    #[serde(default)]
    pub r#type: Option<String>,

    /// Incremental function name and argument fragments.
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

/// Incremental function fields of a [`ToolCallDelta`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FunctionDelta {
    /// Function name, usually on the first frame of a call.
    #[serde(default)]
    pub name: Option<String>,

    /// Argument fragment to append.
    #[serde(default)]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_serialization_omits_unset_fields() {
        let request = ChatRequest {
            model: "anthropic/claude-sonnet-4".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: Some(ChatContent::Text("hi".to_string())),
                tool_calls: None,
                tool_call_id: None,
            }],
            temperature: None,
            stream: false,
            tools: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "anthropic/claude-sonnet-4",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn system_message_with_cache_hint() {
        let message = ChatMessage {
            role: ChatRole::System,
            content: Some(ChatContent::Blocks(vec![TextPart::new("be brief".to_string(), true)])),
            tool_calls: None,
            tool_call_id: None,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "system",
                "content": [{
                    "type": "text",
                    "text": "be brief",
                    "cache_control": {"type": "ephemeral"}
                }]
            })
        );
    }

    #[test]
    fn deserialize_tool_call_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "gen-1",
            "model": "anthropic/claude-sonnet-4",
            "choices": [{
                "index": 0,
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "t1",
                        "type": "function",
                        "function": {"name": "search", "arguments": "{\"q\":\"cats\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }))
        .unwrap();

        let choice = &response.choices[0];
        assert_eq!(choice.finish_reason, Some(FinishReason::ToolCalls));
        assert!(choice.message.content.is_none());
        assert_eq!(choice.message.tool_calls.as_ref().unwrap()[0].id, "t1");
    }

    #[test]
    fn unknown_finish_reasons_are_preserved() {
        let reason: FinishReason = serde_json::from_value(json!("model_error")).unwrap();
        assert!(matches!(reason, FinishReason::Other(r) if r == "model_error"));
    }

    #[test]
    fn usage_only_chunk_has_empty_choices() {
        let chunk: ChatChunk = serde_json::from_value(json!({
            "choices": [],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4}
        }))
        .unwrap();

        assert!(chunk.choices.is_empty());
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.total_tokens, 0);
    }

    #[test]
    fn partial_tool_call_delta() {
        let chunk: ChatChunk = serde_json::from_value(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "\"cats\"}"}}
            ]}}]
        }))
        .unwrap();

        let calls = chunk.choices[0].delta.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, None);
        assert_eq!(
            calls[0].function.as_ref().unwrap().arguments.as_deref(),
            Some("\"cats\"}")
        );
    }
}
