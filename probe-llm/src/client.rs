use crate::dashscope::{self, DashScopeRequest};
use crate::error::{LlmError, Result};
use crate::openai::{self, OpenAiChatRequest};
use crate::provider::{ApiKey, EndpointConfig, WireFormat};
use crate::types::{ChatCompletion, ChatMessage, CompletionRequest, ModelList};
use std::time::Duration;

/// Authenticated client for one chat-completion endpoint.
///
/// Holds a single `reqwest::Client` so consecutive calls reuse connections.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: ApiKey,
    endpoint: EndpointConfig,
}

impl LlmClient {
    /// Fails with [`LlmError::MissingApiKey`] when `api_key` is blank. Nothing is sent.
    pub fn new(api_key: &str, endpoint: EndpointConfig) -> Result<Self> {
        let api_key = ApiKey::new(api_key, endpoint.provider)?;
        Self::from_key(api_key, endpoint)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(provider = endpoint.provider.name()))]
    pub fn from_key(api_key: ApiKey, endpoint: EndpointConfig) -> Result<Self> {
        if endpoint.base_url.trim().is_empty() {
            return Err(LlmError::InvalidInput("base URL must not be empty".to_string()));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_key,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.endpoint.model
    }

    /// Request body exactly as [`LlmClient::complete`] would send it.
    pub fn request_body(
        &self,
        messages: &[ChatMessage],
        req: &CompletionRequest,
    ) -> Result<serde_json::Value> {
        let body = match self.endpoint.wire {
            WireFormat::OpenAi => serde_json::to_value(OpenAiChatRequest::new(messages, req))?,
            WireFormat::DashScope => serde_json::to_value(DashScopeRequest::new(messages, req))?,
        };
        Ok(body)
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %req.model))]
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        req: &CompletionRequest,
    ) -> Result<ChatCompletion> {
        if req.stream {
            return Err(LlmError::InvalidInput(
                "streaming responses are not supported".to_string(),
            ));
        }
        if messages.is_empty() {
            return Err(LlmError::InvalidInput(
                "at least one message is required".to_string(),
            ));
        }

        let url = self.endpoint.chat_url();
        let body = self.request_body(messages, req)?;
        tracing::debug!(%url, "sending chat completion");

        let request = self.http.post(&url).json(&body);
        let (status, raw) = self
            .send(request, &url, self.endpoint.completion_timeout)
            .await?;

        match self.endpoint.wire {
            WireFormat::OpenAi => openai::parse_chat_response(status, raw),
            WireFormat::DashScope => dashscope::parse_response(status, raw),
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn list_models(&self) -> Result<ModelList> {
        let Some(url) = self.endpoint.models_url() else {
            return Err(LlmError::Unsupported(format!(
                "{} endpoint {} does not expose a models list",
                self.endpoint.provider.name(),
                self.endpoint.base_url
            )));
        };
        tracing::debug!(%url, "listing models");

        let request = self.http.get(&url);
        let (_, raw) = self.send(request, &url, self.endpoint.models_timeout).await?;
        openai::parse_model_list(raw)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> Result<(u16, serde_json::Value)> {
        let response = request
            .bearer_auth(self.api_key.expose())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "request failed");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = serde_json::from_str(&body).map_err(|e| {
            LlmError::ResponseFormat(format!("invalid JSON from {url}: {e}"))
        })?;
        Ok((status.as_u16(), raw))
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &self.api_key)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
