use crate::error::{LlmError, Result};
use crate::types::{ChatCompletion, ChatMessage, Choice, CompletionRequest, ModelList, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

impl<'a> OpenAiChatRequest<'a> {
    pub(crate) fn new(messages: &'a [ChatMessage], req: &'a CompletionRequest) -> Self {
        Self {
            model: &req.model,
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
            stream: req.stream,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    message: Option<OpenAiChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    #[serde(default)]
    id: Option<String>,
}

/// Normalize a `choices[].message.content` body.
pub(crate) fn parse_chat_response(status: u16, raw: serde_json::Value) -> Result<ChatCompletion> {
    let parsed: OpenAiChatResponse = serde_json::from_value(raw.clone()).map_err(|e| {
        LlmError::ResponseFormat(format!("openai chat response: {e}"))
    })?;

    let choices = parsed
        .choices
        .into_iter()
        .map(|c| Choice {
            content: c.message.and_then(|m| m.content).unwrap_or_default(),
            finish_reason: c.finish_reason,
        })
        .collect();

    Ok(ChatCompletion {
        status,
        choices,
        usage: parsed.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
        raw,
    })
}

/// Normalize a `data[].id` body.
pub(crate) fn parse_model_list(raw: serde_json::Value) -> Result<ModelList> {
    let parsed: OpenAiModelList = serde_json::from_value(raw.clone())
        .map_err(|e| LlmError::ResponseFormat(format!("openai models response: {e}")))?;
    Ok(ModelList {
        ids: parsed
            .data
            .into_iter()
            .map(|m| m.id.unwrap_or_else(|| "unknown".to_string()))
            .collect(),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::{OpenAiChatRequest, parse_chat_response, parse_model_list};
    use crate::error::LlmError;
    use crate::types::{ChatMessage, CompletionRequest};
    use serde_json::json;

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let messages = vec![
            ChatMessage::system("You are DeepSeek, a helpful AI assistant."),
            ChatMessage::user("Hello"),
        ];
        let req = CompletionRequest::new("deepseek-chat").max_tokens(50);
        let body = serde_json::to_value(OpenAiChatRequest::new(&messages, &req)).expect("serialize");

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert_eq!(body["max_tokens"], 50);
        assert_eq!(body["stream"], false);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn chat_response_is_normalized() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let completion = parse_chat_response(200, raw).expect("valid response");
        assert_eq!(completion.first_content(), "Hi there");
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.expect("usage").completion_tokens, 3);
    }

    #[test]
    fn missing_choices_is_response_format_error() {
        let err = parse_chat_response(200, json!({"object": "error"})).expect_err("must fail");
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }

    #[test]
    fn model_list_collects_ids() {
        let raw = json!({"object": "list", "data": [{"id": "deepseek-chat"}, {"id": "deepseek-reasoner"}]});
        let models = parse_model_list(raw).expect("valid list");
        assert_eq!(models.ids, vec!["deepseek-chat", "deepseek-reasoner"]);
        assert_eq!(models.raw["object"], "list");
    }
}
