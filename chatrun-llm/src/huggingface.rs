use crate::client::ChatProvider;
use crate::error::{LlmError, Result};
use crate::types::{ChatRequest, ChatResponse, ModelConfig, Provider, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const HF_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const HF_INFERENCE_MODELS_PATH: &str = "/hf-inference/models";
const TEXT_GENERATION_TASK: &str = "text-generation";

/// Hugging Face inference router. `conversational` goes through the
/// OpenAI-compatible chat route; `text-generation` goes to the raw model route.
#[derive(Clone)]
pub struct HuggingFaceProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HuggingFaceProvider {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}{HF_CHAT_COMPLETIONS_PATH}", self.base_url)
    }

    fn text_generation_url(&self, model: &str) -> String {
        format!("{}{HF_INFERENCE_MODELS_PATH}/{model}", self.base_url)
    }

    async fn post_json<B: Serialize>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        tracing::debug!(url = %url, "sending huggingface request");
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::from_status("huggingface", status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChatProvider for HuggingFaceProvider {
    fn kind(&self) -> Provider {
        Provider::HfEndpoint
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn complete(
        &self,
        config: &ModelConfig,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        if config.task() == Some(TEXT_GENERATION_TASK) {
            let req = HfTextGenerationRequest::new(config, request);
            let url = self.text_generation_url(config.model());
            let raw = self.post_json(&url, api_key, &req).await?;
            let parsed: HfTextGenerationResponse = serde_json::from_value(raw.clone())?;
            return parsed.into_chat_response(config, raw);
        }

        let req = HfChatRequest::new(config, request);
        let raw = self.post_json(&self.chat_url(), api_key, &req).await?;
        let parsed: HfChatResponse = serde_json::from_value(raw.clone())?;
        parsed.into_chat_response(config, raw)
    }
}

#[derive(Debug, Serialize)]
struct HfChatRequest<'a> {
    model: &'a str,
    messages: Vec<HfMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> HfChatRequest<'a> {
    fn new(config: &'a ModelConfig, request: &'a ChatRequest) -> Self {
        Self {
            model: config.model(),
            messages: vec![HfMessage {
                role: "user",
                content: request.prompt(),
            }],
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HfMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct HfChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<HfChoice>,
    #[serde(default)]
    usage: Option<HfUsage>,
}

#[derive(Debug, Deserialize)]
struct HfChoice {
    message: HfChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HfChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HfUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl HfChatResponse {
    fn into_chat_response(self, config: &ModelConfig, raw: serde_json::Value) -> Result<ChatResponse> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::ResponseFormat("huggingface response missing choices".to_string())
        })?;
        let text = choice.message.content.ok_or_else(|| {
            LlmError::ResponseFormat("huggingface choice missing message content".to_string())
        })?;
        let usage = self
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            text,
            model: self.model.unwrap_or_else(|| config.model().to_string()),
            usage,
            finish_reason: choice
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
            raw,
        })
    }
}

#[derive(Debug, Serialize)]
struct HfTextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: HfTextGenerationParameters,
}

#[derive(Debug, Serialize)]
struct HfTextGenerationParameters {
    // The endpoint rejects 0; omitting it means greedy decoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    return_full_text: bool,
}

impl<'a> HfTextGenerationRequest<'a> {
    fn new(config: &'a ModelConfig, request: &'a ChatRequest) -> Self {
        Self {
            inputs: request.prompt(),
            parameters: HfTextGenerationParameters {
                temperature: Some(config.temperature()).filter(|t| *t > 0.0),
                max_new_tokens: config.max_tokens(),
                return_full_text: false,
            },
        }
    }
}

/// The endpoint answers with either a list of generations or a single one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfTextGenerationResponse {
    Many(Vec<HfGeneration>),
    One(HfGeneration),
}

#[derive(Debug, Deserialize)]
struct HfGeneration {
    generated_text: String,
    #[serde(default)]
    details: Option<HfGenerationDetails>,
}

#[derive(Debug, Deserialize)]
struct HfGenerationDetails {
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    generated_tokens: u32,
}

impl HfTextGenerationResponse {
    fn into_chat_response(self, config: &ModelConfig, raw: serde_json::Value) -> Result<ChatResponse> {
        let generation = match self {
            Self::Many(list) => list.into_iter().next().ok_or_else(|| {
                LlmError::ResponseFormat("huggingface text-generation returned no output".to_string())
            })?,
            Self::One(generation) => generation,
        };
        let (finish_reason, completion_tokens) = match generation.details {
            Some(d) => (d.finish_reason, d.generated_tokens),
            None => (None, 0),
        };

        Ok(ChatResponse {
            text: generation.generated_text,
            model: config.model().to_string(),
            usage: Usage {
                prompt_tokens: 0,
                completion_tokens,
            },
            finish_reason: finish_reason.unwrap_or_else(|| "unknown".to_string()),
            raw,
        })
    }
}
