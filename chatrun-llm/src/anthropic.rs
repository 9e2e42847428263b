use crate::client::ChatProvider;
use crate::error::{LlmError, Result};
use crate::types::{ChatRequest, ChatResponse, ModelConfig, Provider, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The Messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Clone)]
pub struct AnthropicProvider {
    http: reqwest::Client,
    url: String,
}

impl AnthropicProvider {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            url: format!("{}{ANTHROPIC_MESSAGES_PATH}", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> Provider {
        Provider::AnthropicStyle
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn complete(
        &self,
        config: &ModelConfig,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        let req = AnthropicRequest::new(config, request);

        tracing::debug!(url = %self.url, "sending anthropic request");
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::from_status("anthropic", status, &body));
        }

        let raw: serde_json::Value = serde_json::from_str(&body)?;
        let parsed: AnthropicResponse = serde_json::from_value(raw.clone())?;
        Ok(parsed.into_chat_response(raw))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

impl<'a> AnthropicRequest<'a> {
    fn new(config: &'a ModelConfig, request: &'a ChatRequest) -> Self {
        Self {
            model: config.model(),
            max_tokens: config.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicRequestBlock::Text {
                    text: request.prompt(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicRequestBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicRequestBlock<'a> {
    Text { text: &'a str },
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicResponse {
    fn into_chat_response(self, raw: serde_json::Value) -> ChatResponse {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect::<String>();

        ChatResponse {
            text,
            model: self.model,
            usage: Usage {
                prompt_tokens: self.usage.input_tokens,
                completion_tokens: self.usage.output_tokens,
            },
            finish_reason: self.stop_reason.unwrap_or_else(|| "unknown".to_string()),
            raw,
        }
    }
}
