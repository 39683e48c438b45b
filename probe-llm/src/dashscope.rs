use crate::error::{LlmError, Result};
use crate::types::{ChatCompletion, ChatMessage, Choice, CompletionRequest, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct DashScopeRequest<'a> {
    model: &'a str,
    input: DashScopeInput<'a>,
    parameters: DashScopeParameters,
}

#[derive(Debug, Serialize)]
struct DashScopeInput<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Debug, Serialize)]
struct DashScopeParameters {
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl<'a> DashScopeRequest<'a> {
    pub(crate) fn new(messages: &'a [ChatMessage], req: &'a CompletionRequest) -> Self {
        Self {
            model: &req.model,
            input: DashScopeInput { messages },
            parameters: DashScopeParameters {
                temperature: req.temperature,
                max_tokens: req.max_tokens,
                top_p: req.top_p,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct DashScopeResponse {
    output: DashScopeOutput,
    #[serde(default)]
    usage: Option<DashScopeUsage>,
}

#[derive(Debug, Deserialize)]
struct DashScopeOutput {
    #[serde(default)]
    choices: Option<Vec<DashScopeChoice>>,
    /// Present instead of `choices` when the service answers in text result format.
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashScopeChoice {
    #[serde(default)]
    message: Option<DashScopeMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashScopeMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashScopeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Normalize an `output.choices[].message.content` body.
pub(crate) fn parse_response(status: u16, raw: serde_json::Value) -> Result<ChatCompletion> {
    let parsed: DashScopeResponse = serde_json::from_value(raw.clone())
        .map_err(|e| LlmError::ResponseFormat(format!("dashscope response: {e}")))?;

    let output = parsed.output;
    let choices = match (output.choices, output.text) {
        (Some(choices), _) => choices
            .into_iter()
            .map(|c| Choice {
                content: c.message.and_then(|m| m.content).unwrap_or_default(),
                finish_reason: c.finish_reason,
            })
            .collect(),
        (None, Some(text)) => vec![Choice {
            content: text,
            finish_reason: output.finish_reason,
        }],
        (None, None) => {
            return Err(LlmError::ResponseFormat(
                "dashscope response has neither output.choices nor output.text".to_string(),
            ));
        }
    };

    Ok(ChatCompletion {
        status,
        choices,
        usage: parsed.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        }),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::{DashScopeRequest, parse_response};
    use crate::error::LlmError;
    use crate::types::{ChatMessage, CompletionRequest};
    use serde_json::json;

    #[test]
    fn request_nests_messages_and_parameters() {
        let messages = vec![ChatMessage::user("Say hello in 5 words or less.")];
        let req = CompletionRequest::new("qwen3-72b-chat").max_tokens(50);
        let body = serde_json::to_value(DashScopeRequest::new(&messages, &req)).expect("serialize");

        assert_eq!(body["model"], "qwen3-72b-chat");
        assert_eq!(body["input"]["messages"][0]["role"], "user");
        assert_eq!(body["parameters"]["max_tokens"], 50);
        assert!(body["parameters"].get("top_p").is_none());
        assert!(body.get("messages").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn top_p_is_sent_when_set() {
        let messages = vec![ChatMessage::user("Explain quantum computing in 50 words")];
        let req = CompletionRequest::new("qwen3-235b-a22b").max_tokens(500).top_p(0.9);
        let body = serde_json::to_value(DashScopeRequest::new(&messages, &req)).expect("serialize");
        let top_p = body["parameters"]["top_p"].as_f64().expect("top_p is a number");
        assert!((top_p - 0.9).abs() < 1e-6);
    }

    #[test]
    fn message_format_output_is_normalized() {
        let raw = json!({
            "output": {
                "choices": [{
                    "finish_reason": "stop",
                    "message": {"role": "assistant", "content": "Hello there, friend!"}
                }]
            },
            "usage": {"input_tokens": 14, "output_tokens": 5},
            "request_id": "abc"
        });
        let completion = parse_response(200, raw).expect("valid response");
        assert_eq!(completion.first_content(), "Hello there, friend!");
        assert_eq!(completion.usage.expect("usage").prompt_tokens, 14);
    }

    #[test]
    fn text_format_output_becomes_single_choice() {
        let raw = json!({"output": {"text": "Qubits superpose.", "finish_reason": "stop"}});
        let completion = parse_response(200, raw).expect("valid response");
        assert_eq!(completion.choices.len(), 1);
        assert_eq!(completion.first_content(), "Qubits superpose.");
    }

    #[test]
    fn openai_shaped_body_is_rejected() {
        let raw = json!({"choices": [{"message": {"content": "hi"}}]});
        let err = parse_response(200, raw).expect_err("wrong shape");
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }
}
