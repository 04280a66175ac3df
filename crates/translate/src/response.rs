//! Buffered response translation from the Chat Completions dialect back
//! to the Messages dialect.

use jiff::Timestamp;
use serde_json::Value;

use crate::messages::{
    anthropic::{ContentBlock, MessagesResponse, Role, StopReason, Usage},
    openai::{ChatResponse, FinishReason, ToolCall},
};

/// Translate a buffered completion into a Messages response.
///
/// Only `choices[0]` is inspected. A non-null `content` string wins over
/// `tool_calls`; with neither, the content array is empty. The response id
/// is generated at translation time.
pub fn to_messages_response(response: ChatResponse, model: &str) -> MessagesResponse {
    translate(response, model, message_id())
}

/// A fresh `msg_<unix-millis>` identifier.
pub(crate) fn message_id() -> String {
    format!("msg_{}", Timestamp::now().as_millisecond())
}

fn translate(response: ChatResponse, model: &str, id: String) -> MessagesResponse {
    let choice = response.choices.into_iter().next();

    let mut content = Vec::new();
    let mut finish_reason = None;

    if let Some(choice) = choice {
        finish_reason = choice.finish_reason;

        if let Some(text) = choice.message.content {
            content.push(ContentBlock::Text { text });
        } else if let Some(calls) = choice.message.tool_calls.filter(|calls| !calls.is_empty()) {
            content.extend(calls.into_iter().map(tool_use_block));
        }
    }

    let stop_reason = match finish_reason {
        Some(FinishReason::ToolCalls) => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    };

    let usage = response
        .usage
        .map(|usage| Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
        .unwrap_or_default();

    MessagesResponse {
        id,
        r#type: "message".to_string(),
        role: Role::Assistant,
        content,
        model: model.to_string(),
        stop_reason: Some(stop_reason),
        stop_sequence: None,
        usage,
    }
}

fn tool_use_block(call: ToolCall) -> ContentBlock {
    // Unparseable argument strings leave the input unset, which serializes
    // as an omitted field rather than an empty object.
    let input = if call.function.arguments.is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(&call.function.arguments).ok()
    };

    ContentBlock::ToolUse {
        id: call.id,
        name: call.function.name,
        input,
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;
    use serde_json::json;

    use super::{to_messages_response, translate};
    use crate::messages::{
        anthropic::{ContentBlock, StopReason},
        openai::ChatResponse,
    };

    fn response(value: serde_json::Value) -> ChatResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn simple_text_completion() {
        let translated = translate(
            response(json!({
                "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1}
            })),
            "anthropic/claude-sonnet-4",
            "msg_0".to_string(),
        );

        assert_json_snapshot!(translated, @r#"
        {
          "id": "msg_0",
          "type": "message",
          "role": "assistant",
          "content": [
            {
              "type": "text",
              "text": "hello"
            }
          ],
          "model": "anthropic/claude-sonnet-4",
          "stop_reason": "end_turn",
          "stop_sequence": null,
          "usage": {
            "input_tokens": 3,
            "output_tokens": 1
          }
        }
        "#);
    }

    #[test]
    fn generated_id_uses_millisecond_prefix() {
        let translated = to_messages_response(response(json!({"choices": []})), "m");
        assert!(translated.id.starts_with("msg_"));
        assert!(translated.id["msg_".len()..].parse::<i64>().is_ok());
    }

    #[test]
    fn text_content_is_preserved_byte_for_byte() {
        let text = "  spacing\nand\tcontrol chars stay ";
        let translated = translate(
            response(json!({"choices": [{"message": {"content": text}}]})),
            "m",
            "msg_0".to_string(),
        );

        let ContentBlock::Text { text: out } = &translated.content[0] else {
            unreachable!("expected a text block");
        };
        assert_eq!(out, text);
    }

    #[test]
    fn tool_calls_become_tool_use_blocks_in_order() {
        let translated = translate(
            response(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [
                            {"id": "t1", "type": "function", "function": {"name": "search", "arguments": "{\"q\":\"cats\"}"}},
                            {"id": "t2", "type": "function", "function": {"name": "fetch", "arguments": "{}"}}
                        ]
                    },
                    "finish_reason": "tool_calls"
                }]
            })),
            "m",
            "msg_0".to_string(),
        );

        assert_eq!(translated.stop_reason, Some(StopReason::ToolUse));
        assert_json_snapshot!(translated.content, @r#"
        [
          {
            "type": "tool_use",
            "id": "t1",
            "name": "search",
            "input": {
              "q": "cats"
            }
          },
          {
            "type": "tool_use",
            "id": "t2",
            "name": "fetch",
            "input": {}
          }
        ]
        "#);
    }

    #[test]
    fn unparseable_arguments_leave_input_unset() {
        let translated = translate(
            response(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [
                            {"id": "t1", "type": "function", "function": {"name": "search", "arguments": "{broken"}}
                        ]
                    },
                    "finish_reason": "tool_calls"
                }]
            })),
            "m",
            "msg_0".to_string(),
        );

        let block = serde_json::to_value(&translated.content[0]).unwrap();
        assert_eq!(block, json!({"type": "tool_use", "id": "t1", "name": "search"}));
    }

    #[test]
    fn text_content_wins_over_tool_calls() {
        let translated = translate(
            response(json!({
                "choices": [{
                    "message": {
                        "content": "done",
                        "tool_calls": [
                            {"id": "t1", "type": "function", "function": {"name": "noop", "arguments": "{}"}}
                        ]
                    }
                }]
            })),
            "m",
            "msg_0".to_string(),
        );

        assert_eq!(translated.content.len(), 1);
        assert!(matches!(&translated.content[0], ContentBlock::Text { text } if text == "done"));
    }

    #[test]
    fn unknown_finish_reason_maps_to_end_turn() {
        let translated = translate(
            response(json!({
                "choices": [{"message": {"content": "x"}, "finish_reason": "model_error"}]
            })),
            "m",
            "msg_0".to_string(),
        );

        assert_eq!(translated.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn absent_usage_reports_zeroes() {
        let translated = translate(
            response(json!({"choices": [{"message": {"content": "x"}}]})),
            "m",
            "msg_0".to_string(),
        );

        assert_eq!(translated.usage.input_tokens, 0);
        assert_eq!(translated.usage.output_tokens, 0);
    }

    #[test]
    fn empty_choices_degrade_to_empty_content() {
        let translated = translate(response(json!({"choices": []})), "m", "msg_0".to_string());

        assert!(translated.content.is_empty());
        assert_eq!(translated.stop_reason, Some(StopReason::EndTurn));
    }
}
