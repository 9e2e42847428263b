use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side default for both providers.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Task a Hugging Face config gets when none is set.
pub const HF_DEFAULT_TASK: &str = "conversational";

/// Tasks a chat adapter over a Hugging Face endpoint can serve.
pub const HF_TASKS: &[&str] = &["conversational", "text-generation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    AnthropicStyle,
    HfEndpoint,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::AnthropicStyle => "anthropic",
            Provider::HfEndpoint => "huggingface",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    provider: Provider,
    model: String,
    task: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ModelConfig {
    /// Hugging Face configs start on the `conversational` task.
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        let task = match provider {
            Provider::AnthropicStyle => None,
            Provider::HfEndpoint => Some(HF_DEFAULT_TASK.to_string()),
        };
        Self {
            provider,
            model: model.into(),
            task,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Reject configs no provider could serve, before anything goes on the wire.
    pub fn validate(&self) -> Result<()> {
        let model = self.model.as_str();
        if model.trim().is_empty() {
            return Err(LlmError::InvalidModel("model identifier is empty".to_string()));
        }
        if model.chars().any(char::is_whitespace) {
            return Err(LlmError::InvalidModel(format!(
                "model identifier {model:?} contains whitespace"
            )));
        }
        if self.provider == Provider::HfEndpoint && !is_hub_repo_id(model) {
            return Err(LlmError::InvalidModel(format!(
                "{model:?} is not a Hugging Face repo id (expected name or owner/name)"
            )));
        }

        match (self.provider, self.task.as_deref()) {
            (_, None) => {}
            (Provider::AnthropicStyle, Some(task)) => {
                return Err(LlmError::InvalidModel(format!(
                    "anthropic models take no task, got {task:?}"
                )));
            }
            (Provider::HfEndpoint, Some(task)) => {
                if !HF_TASKS.contains(&task) {
                    return Err(LlmError::InvalidModel(format!(
                        "unsupported task {task:?}; expected one of: {}",
                        HF_TASKS.join(", ")
                    )));
                }
            }
        }

        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(LlmError::InvalidInput(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(LlmError::InvalidInput("max_tokens must be > 0".to_string()));
        }
        Ok(())
    }
}

fn is_hub_repo_id(model: &str) -> bool {
    let valid_part = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    };
    match model.split_once('/') {
        Some((owner, name)) => valid_part(owner) && valid_part(name),
        None => valid_part(model),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    prompt: String,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidInput("prompt is empty".to_string()));
        }
        Ok(Self { prompt })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    /// Model name as reported by the provider.
    pub model: String,
    pub usage: Usage,
    pub finish_reason: String,
    /// Full JSON body the provider returned.
    pub raw: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub huggingface_token: Option<String>,
}

impl Credentials {
    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::AnthropicStyle => self.anthropic_api_key.as_deref(),
            Provider::HfEndpoint => self.huggingface_token.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }
}

// Keys stay out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &mask(&self.anthropic_api_key))
            .field("huggingface_token", &mask(&self.huggingface_token))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hf() -> ModelConfig {
        ModelConfig::new(Provider::HfEndpoint, "deepseek-ai/DeepSeek-R1")
            .with_task("conversational")
            .with_temperature(0.2)
            .with_max_tokens(64)
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ModelConfig::new(Provider::AnthropicStyle, "model_name");
        assert_eq!(cfg.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(cfg.max_tokens(), None);
        assert_eq!(cfg.task(), None);
        cfg.validate().expect("default anthropic config is valid");
        assert_eq!(
            ModelConfig::new(Provider::HfEndpoint, "gpt2").task(),
            Some(HF_DEFAULT_TASK)
        );
        hf().validate().expect("hf config is valid");
    }

    #[test]
    fn blank_or_spaced_model_is_invalid_model() {
        for model in ["", "   ", "claude sonnet"] {
            let err = ModelConfig::new(Provider::AnthropicStyle, model)
                .validate()
                .expect_err("should reject");
            assert!(matches!(err, LlmError::InvalidModel(_)), "{model:?}: {err}");
        }
    }

    #[test]
    fn hf_model_must_be_repo_id() {
        for model in ["a/b/c", "/DeepSeek-R1", "owner/", "deep$eek/R1"] {
            let err = ModelConfig::new(Provider::HfEndpoint, model)
                .validate()
                .expect_err("should reject");
            assert!(matches!(err, LlmError::InvalidModel(_)), "{model:?}: {err}");
        }
        ModelConfig::new(Provider::HfEndpoint, "gpt2")
            .validate()
            .expect("bare repo name is valid");
    }

    #[test]
    fn task_rules_per_provider() {
        let err = ModelConfig::new(Provider::AnthropicStyle, "claude-x")
            .with_task("conversational")
            .validate()
            .expect_err("anthropic takes no task");
        assert!(matches!(err, LlmError::InvalidModel(_)));

        let err = hf().with_task("summarization").validate().expect_err("bad task");
        assert!(matches!(err, LlmError::InvalidModel(ref m) if m.contains("summarization")));

        hf().with_task("text-generation")
            .validate()
            .expect("text-generation is chat-capable");
    }

    #[test]
    fn numeric_options_are_bounded() {
        for t in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            let err = hf().with_temperature(t).validate().expect_err("out of range");
            assert!(matches!(err, LlmError::InvalidInput(_)), "{t}: {err}");
        }
        hf().with_temperature(0.0).validate().expect("lower bound");
        hf().with_temperature(1.0).validate().expect("upper bound");

        let err = hf().with_max_tokens(0).validate().expect_err("zero tokens");
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }

    #[test]
    fn empty_prompt_rejected() {
        assert!(matches!(ChatRequest::new(""), Err(LlmError::InvalidInput(_))));
        assert!(matches!(ChatRequest::new(" \n\t"), Err(LlmError::InvalidInput(_))));
        let req = ChatRequest::new("What is the capital of India?").expect("valid prompt");
        assert_eq!(req.prompt(), "What is the capital of India?");
    }

    #[test]
    fn credentials_ignore_blank_keys_and_hide_values() {
        let creds = Credentials {
            anthropic_api_key: Some("  ".to_string()),
            huggingface_token: Some(" hf_secret ".to_string()),
        };
        assert_eq!(creds.key_for(Provider::AnthropicStyle), None);
        assert_eq!(creds.key_for(Provider::HfEndpoint), Some("hf_secret"));

        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("hf_secret"));
        assert!(dbg.contains("<set>"));
    }
}
