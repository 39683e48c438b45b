//! Endpoint presets and credentials for the supported providers.

use crate::error::{LlmError, Result};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DeepSeek,
    DashScope,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::DeepSeek => "DeepSeek",
            Provider::DashScope => "DashScope",
        }
    }

    /// Environment variable that supplies the bearer token.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::DashScope => "DASHSCOPE_API_KEY",
        }
    }
}

/// Request/response body convention spoken by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `{model, messages, ...}` in, `choices[].message.content` out.
    OpenAi,
    /// `{model, input: {messages}, parameters}` in, `output.choices[].message.content` out.
    DashScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub provider: Provider,
    pub wire: WireFormat,
    pub base_url: String,
    /// Path segment between the base URL and the operation path, e.g. `v1`.
    pub api_version: Option<String>,
    pub chat_path: String,
    pub models_path: Option<String>,
    pub model: String,
    pub completion_timeout: Duration,
    pub models_timeout: Duration,
}

impl EndpointConfig {
    pub fn deepseek() -> Self {
        Self {
            provider: Provider::DeepSeek,
            wire: WireFormat::OpenAi,
            base_url: "https://api.deepseek.com".to_string(),
            api_version: Some("v1".to_string()),
            chat_path: "chat/completions".to_string(),
            models_path: Some("models".to_string()),
            model: "deepseek-chat".to_string(),
            completion_timeout: Duration::from_secs(60),
            models_timeout: Duration::from_secs(30),
        }
    }

    /// DashScope chat endpoint taking DashScope-shaped bodies.
    pub fn dashscope_chat() -> Self {
        Self {
            provider: Provider::DashScope,
            wire: WireFormat::DashScope,
            base_url: "https://dashscope.aliyuncs.com/v1".to_string(),
            api_version: None,
            chat_path: "chat/completions".to_string(),
            models_path: None,
            model: "qwen3-72b-chat".to_string(),
            completion_timeout: Duration::from_secs(30),
            models_timeout: Duration::from_secs(30),
        }
    }

    /// DashScope native text-generation service.
    pub fn dashscope_generation() -> Self {
        Self {
            provider: Provider::DashScope,
            wire: WireFormat::DashScope,
            base_url: "https://dashscope.aliyuncs.com/api/v1".to_string(),
            api_version: None,
            chat_path: "services/aigc/text-generation/generation".to_string(),
            models_path: None,
            model: "qwen3-235b-a22b".to_string(),
            completion_timeout: Duration::from_secs(60),
            models_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        let v = api_version.into();
        self.api_version = Some(v).filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn chat_url(&self) -> String {
        self.url_for(&self.chat_path)
    }

    pub fn models_url(&self) -> Option<String> {
        self.models_path.as_deref().map(|p| self.url_for(p))
    }

    fn url_for(&self, path: &str) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        if let Some(version) = self.api_version.as_deref() {
            url.push('/');
            url.push_str(version.trim_matches('/'));
        }
        url.push('/');
        url.push_str(path.trim_start_matches('/'));
        url
    }
}

/// Bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate an explicit token. Blank tokens are a configuration error.
    pub fn new(value: impl Into<String>, provider: Provider) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LlmError::MissingApiKey {
                env_var: provider.api_key_env().to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Resolve from the explicit value first, then the provider's environment variable.
    pub fn resolve(explicit: Option<&str>, provider: Provider) -> Result<Self> {
        Self::resolve_with(explicit, provider, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(explicit: Option<&str>, provider: Provider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_flag = explicit
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let value = from_flag.or_else(|| {
            lookup(provider.api_key_env()).filter(|v| !v.trim().is_empty())
        });
        match value {
            Some(v) => Self::new(v, provider),
            None => Err(LlmError::MissingApiKey {
                env_var: provider.api_key_env().to_string(),
            }),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
