use crate::anthropic::AnthropicProvider;
use crate::error::{LlmError, Result};
use crate::huggingface::HuggingFaceProvider;
use crate::types::{ChatRequest, ChatResponse, Credentials, ModelConfig, Provider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co";

/// One remote chat API.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> Provider;

    /// Issue exactly one request. `api_key` is already checked to be non-blank.
    async fn complete(
        &self,
        config: &ModelConfig,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse>;
}

/// Base URLs for the built-in providers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub anthropic: String,
    pub huggingface: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            anthropic: ANTHROPIC_BASE_URL.to_string(),
            huggingface: HUGGINGFACE_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PromptRunner {
    credentials: Credentials,
    anthropic: Arc<dyn ChatProvider>,
    huggingface: Arc<dyn ChatProvider>,
}

impl PromptRunner {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        // No timeout: the provider's own limits apply.
        let http = reqwest::Client::builder()
            .user_agent(concat!("chatrun/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self {
            credentials,
            anthropic: Arc::new(AnthropicProvider::new(http.clone(), &endpoints.anthropic)),
            huggingface: Arc::new(HuggingFaceProvider::new(http, &endpoints.huggingface)),
        }
    }

    /// Replace the built-in provider of the same kind.
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        match provider.kind() {
            Provider::AnthropicStyle => self.anthropic = provider,
            Provider::HfEndpoint => self.huggingface = provider,
        }
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Send one prompt and wait for the reply. Input, config and credentials are all
    /// checked before the provider is contacted.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(provider = %config.provider(), model = %config.model())
    )]
    pub async fn run(&self, config: &ModelConfig, prompt: &str) -> Result<ChatResponse> {
        let request = ChatRequest::new(prompt)?;
        config.validate()?;
        let api_key = self.credentials.key_for(config.provider()).ok_or_else(|| {
            LlmError::Authentication(format!("no api key configured for {}", config.provider()))
        })?;

        let provider = match config.provider() {
            Provider::AnthropicStyle => &self.anthropic,
            Provider::HfEndpoint => &self.huggingface,
        };

        let started = Instant::now();
        let result = provider.complete(config, api_key, &request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(resp) => tracing::info!(
                elapsed_ms,
                prompt_tokens = resp.usage.prompt_tokens,
                completion_tokens = resp.usage.completion_tokens,
                finish_reason = %resp.finish_reason,
                "prompt completed"
            ),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "prompt failed"),
        }
        result
    }
}
