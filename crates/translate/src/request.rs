//! Request translation from the Messages dialect to the Chat Completions
//! dialect.
//!
//! Structured content parts are flattened into plain strings, `tool_use`
//! blocks are lifted into the sibling `tool_calls` array with their inputs
//! re-encoded as JSON strings, and `tool_result` blocks become standalone
//! `tool`-role messages. A repair pass then drops tool calls and tool
//! messages whose other half is missing, which compensates for clients
//! that replay partial tool history.

use crate::{
    mapper::ModelMapper,
    messages::{
        anthropic::{ContentPart, Message, MessageContent, MessagesRequest, Role, SystemPrompt, Tool},
        openai::{
            ChatContent, ChatMessage, ChatRequest, ChatRole, FunctionDefinition, TextPart, ToolCall, ToolDefinition,
        },
    },
};
use serde_json::Value;

/// Substring of the requested model that opts system parts into the
/// prompt-cache hint.
const CACHED_MODEL_MARKER: &str = "claude";

/// Translate a Messages request into a Chat Completions request.
pub fn to_chat_request(request: MessagesRequest, mapper: &ModelMapper) -> ChatRequest {
    let translated = translate_messages(request.messages);
    let mut messages = system_messages(request.system, &request.model);
    messages.extend(repair_tool_call_pairing(translated));

    let tools = request
        .tools
        .filter(|tools| !tools.is_empty())
        .map(|tools| tools.into_iter().map(tool_definition).collect());

    ChatRequest {
        model: mapper.map(&request.model),
        messages,
        temperature: request.temperature,
        stream: request.stream,
        tools,
    }
}

fn translate_messages(messages: Vec<Message>) -> Vec<ChatMessage> {
    let mut translated = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::Assistant => translate_assistant(message.content, &mut translated),
            Role::User => translate_user(message.content, &mut translated),
            Role::Other(_) => {}
        }
    }

    translated
}

fn translate_assistant(content: MessageContent, out: &mut Vec<ChatMessage>) {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    match content {
        MessageContent::Text(s) => text = s,
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text: t } => {
                        text.push_str(&t);
                        text.push('\n');
                    }
                    ContentPart::ToolUse { id, name, input } => {
                        let arguments = serde_json::to_string(&input).unwrap_or_default();
                        tool_calls.push(ToolCall::function(id, name, arguments));
                    }
                    ContentPart::ToolResult { .. } | ContentPart::Unknown => {}
                }
            }
        }
    }

    let text = text.trim();
    if text.is_empty() && tool_calls.is_empty() {
        return;
    }

    out.push(ChatMessage {
        role: ChatRole::Assistant,
        content: (!text.is_empty()).then(|| ChatContent::Text(text.to_string())),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
    });
}

fn translate_user(content: MessageContent, out: &mut Vec<ChatMessage>) {
    let mut text = String::new();
    let mut tool_messages = Vec::new();

    match content {
        MessageContent::Text(s) => text = s,
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text: t } => {
                        text.push_str(&t);
                        text.push('\n');
                    }
                    ContentPart::ToolResult { tool_use_id, content } => {
                        tool_messages.push(ChatMessage {
                            role: ChatRole::Tool,
                            content: tool_result_content(content),
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id),
                        });
                    }
                    ContentPart::ToolUse { .. } | ContentPart::Unknown => {}
                }
            }
        }
    }

    let text = text.trim();
    if !text.is_empty() {
        out.push(ChatMessage {
            role: ChatRole::User,
            content: Some(ChatContent::Text(text.to_string())),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    out.extend(tool_messages);
}

fn tool_result_content(content: Value) -> Option<ChatContent> {
    match content {
        Value::Null => None,
        Value::String(s) => Some(ChatContent::Text(s)),
        other => Some(ChatContent::Json(other)),
    }
}

fn system_messages(system: Option<SystemPrompt>, requested_model: &str) -> Vec<ChatMessage> {
    let cached = requested_model.contains(CACHED_MODEL_MARKER);

    match system {
        None => Vec::new(),
        Some(SystemPrompt::Text(text)) => vec![system_message(text, cached)],
        Some(SystemPrompt::Blocks(blocks)) => blocks
            .into_iter()
            .filter_map(|block| block.text)
            .map(|text| system_message(text, cached))
            .collect(),
    }
}

fn system_message(text: String, cached: bool) -> ChatMessage {
    ChatMessage {
        role: ChatRole::System,
        content: Some(ChatContent::Blocks(vec![TextPart::new(text, cached)])),
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Drop tool calls without a result and tool messages without a call.
///
/// A tool call on an assistant message survives only if the contiguous run
/// of `tool` messages that follows contains a matching `tool_call_id`; an
/// assistant message left with neither content nor calls is dropped. A
/// `tool` message survives only if the nearest preceding non-`tool`
/// message is an assistant carrying a matching call. Lookbacks consult the
/// pre-repair list, so a tool message is kept even when its anchoring
/// assistant message is dropped by this same pass.
pub(crate) fn repair_tool_call_pairing(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut repaired = Vec::with_capacity(messages.len());

    for (i, message) in messages.iter().enumerate() {
        let has_calls = message.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty());

        match message.role {
            ChatRole::Assistant if has_calls => {
                let answered: Vec<&str> = messages[i + 1..]
                    .iter()
                    .take_while(|m| m.role == ChatRole::Tool)
                    .filter_map(|m| m.tool_call_id.as_deref())
                    .collect();

                let calls: Vec<ToolCall> = message
                    .tool_calls
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|call| answered.contains(&call.id.as_str()))
                    .collect();

                let mut kept = message.clone();
                kept.tool_calls = (!calls.is_empty()).then_some(calls);

                if kept.content.is_some() || kept.tool_calls.is_some() {
                    repaired.push(kept);
                }
            }
            ChatRole::Tool => {
                if has_anchoring_call(&messages[..i], message.tool_call_id.as_deref()) {
                    repaired.push(message.clone());
                }
            }
            _ => repaired.push(message.clone()),
        }
    }

    repaired
}

fn has_anchoring_call(preceding: &[ChatMessage], tool_call_id: Option<&str>) -> bool {
    let Some(id) = tool_call_id else {
        return false;
    };

    // Skip back over the contiguous tool run to the anchoring message.
    match preceding.iter().rev().find(|m| m.role != ChatRole::Tool) {
        Some(anchor) if anchor.role == ChatRole::Assistant => {
            anchor.tool_calls.iter().flatten().any(|call| call.id == id)
        }
        _ => false,
    }
}

fn tool_definition(tool: Tool) -> ToolDefinition {
    ToolDefinition {
        r#type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
        },
    }
}
