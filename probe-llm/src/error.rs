use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key provided: set {env_var} or pass --api-key")]
    MissingApiKey { env_var: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout(e.to_string());
        }
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}

/// Summarize a provider error body for display.
///
/// Handles `{"error": {"message": ...}}` (OpenAI style), `{"code": ..., "message": ...}`
/// (DashScope) and plain `{"message": ...}`. Anything else is returned trimmed as-is.
pub fn api_error_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.to_string();
    };

    if let Some(error) = json.get("error") {
        if let Some(msg) = error.get("message").and_then(|v| v.as_str()) {
            return match error.get("code").and_then(|v| v.as_str()) {
                Some(code) => format!("{msg} (code: {code})"),
                None => msg.to_string(),
            };
        }
        if let Some(msg) = error.as_str() {
            return msg.to_string();
        }
    }

    if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
        return match json.get("code").and_then(|v| v.as_str()) {
            Some(code) => format!("{msg} (code: {code})"),
            None => msg.to_string(),
        };
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::{LlmError, api_error_message};

    #[test]
    fn status_error_displays_code_and_body() {
        let err = LlmError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "http status 401: unauthorized");
    }

    #[test]
    fn missing_key_names_the_env_var() {
        let err = LlmError::MissingApiKey {
            env_var: "DEEPSEEK_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn api_error_message_extracts_nested_and_flat_shapes() {
        assert_eq!(
            api_error_message(r#"{"error":{"message":"Invalid key","code":"invalid_api_key"}}"#),
            "Invalid key (code: invalid_api_key)"
        );
        assert_eq!(
            api_error_message(r#"{"code":"InvalidApiKey","message":"Invalid API-key provided."}"#),
            "Invalid API-key provided. (code: InvalidApiKey)"
        );
        assert_eq!(api_error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(api_error_message("  gateway down \n"), "gateway down");
    }
}
