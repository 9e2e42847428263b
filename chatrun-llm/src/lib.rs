//! Single-prompt LLM client.
//!
//! Pure HTTP client over the Anthropic Messages API and the Hugging Face
//! chat-completions router. Credentials are passed in; nothing here reads the
//! process environment.

mod anthropic;
mod client;
mod error;
mod huggingface;
mod types;

pub use anthropic::AnthropicProvider;
pub use client::{ChatProvider, Endpoints, PromptRunner};
pub use error::{LlmError, Result};
pub use huggingface::HuggingFaceProvider;
pub use types::{
    ChatRequest, ChatResponse, Credentials, DEFAULT_TEMPERATURE, HF_DEFAULT_TASK, HF_TASKS,
    ModelConfig, Provider, Usage,
};
