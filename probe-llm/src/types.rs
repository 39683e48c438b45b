use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: None,
            stream: false,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub content: String,
    pub finish_reason: Option<String>,
}

/// Provider-independent view of a completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// HTTP status of the response.
    pub status: u16,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
    /// Body as returned by the server.
    pub raw: serde_json::Value,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

impl ChatCompletion {
    /// Text of the first choice, empty when there are no choices.
    pub fn first_content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.content.as_str())
            .unwrap_or("")
    }

    pub fn has_content(&self) -> bool {
        self.choices.iter().any(|c| !c.content.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub ids: Vec<String>,
    /// Body as returned by the server.
    pub raw: serde_json::Value,
}

impl ModelList {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatCompletion, ChatMessage, Choice, CompletionRequest, Role};

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage::system("be brief");
        let v = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(v, serde_json::json!({"role": "system", "content": "be brief"}));
        assert_eq!(ChatMessage::user("hi").role, Role::User);
    }

    #[test]
    fn request_builder_overrides_defaults() {
        let req = CompletionRequest::new("deepseek-chat")
            .max_tokens(50)
            .top_p(0.9);
        assert_eq!(req.model, "deepseek-chat");
        assert_eq!(req.max_tokens, 50);
        assert_eq!(req.top_p, Some(0.9));
        assert!(!req.stream);
    }

    #[test]
    fn whitespace_only_choices_do_not_count_as_content() {
        let completion = ChatCompletion {
            status: 200,
            choices: vec![Choice {
                content: "  \n".to_string(),
                finish_reason: None,
            }],
            usage: None,
            raw: serde_json::Value::Null,
        };
        assert!(!completion.has_content());
        assert_eq!(completion.first_content(), "  \n");
    }
}
