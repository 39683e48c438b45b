//! HTTP client for chat-completion endpoints probed by `llmprobe`.
//!
//! Speaks two body conventions (OpenAI-style and DashScope) and normalizes
//! both into [`ChatCompletion`].

mod client;
mod dashscope;
mod error;
mod openai;
mod provider;
mod types;

pub use client::LlmClient;
pub use error::{LlmError, Result, api_error_message};
pub use provider::{ApiKey, EndpointConfig, Provider, WireFormat};
pub use types::{
    ChatCompletion, ChatMessage, Choice, CompletionRequest, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, ModelList, Role, Usage,
};
