//! chatrun configuration loader.
//!
//! File values come from `~/.chatrun/config.toml` (or `--config`); environment
//! variables, including those loaded from `.env`, win over the file.

use chatrun_llm::{Credentials, Endpoints};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatrunConfig {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

#[derive(Clone, Default, Deserialize)]
pub struct KeysConfig {
    pub anthropic_api_key: Option<String>,
    pub huggingface_token: Option<String>,
}

impl std::fmt::Debug for KeysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysConfig")
            .field("anthropic_api_key", &self.anthropic_api_key.is_some())
            .field("huggingface_token", &self.huggingface_token.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointsConfig {
    pub anthropic_url: Option<String>,
    pub huggingface_url: Option<String>,
}

impl ChatrunConfig {
    /// An explicit path must exist; the default path is optional.
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::from_toml_str(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using environment only");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_blank("ANTHROPIC_API_KEY") {
            self.keys.anthropic_api_key = Some(v);
        }
        if let Some(v) = non_blank("HUGGINGFACEHUB_API_TOKEN").or_else(|| non_blank("HF_TOKEN")) {
            self.keys.huggingface_token = Some(v);
        }
        if let Some(v) = non_blank("CHATRUN_ANTHROPIC_URL") {
            self.endpoints.anthropic_url = Some(v);
        }
        if let Some(v) = non_blank("CHATRUN_HUGGINGFACE_URL") {
            self.endpoints.huggingface_url = Some(v);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let urls = [
            ("endpoints.anthropic_url", &self.endpoints.anthropic_url),
            ("endpoints.huggingface_url", &self.endpoints.huggingface_url),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(anyhow::anyhow!(
                        "{name} must be an http(s) url, got {url:?}"
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            anthropic_api_key: self.keys.anthropic_api_key.clone(),
            huggingface_token: self.keys.huggingface_token.clone(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        Endpoints {
            anthropic: self
                .endpoints
                .anthropic_url
                .clone()
                .unwrap_or(defaults.anthropic),
            huggingface: self
                .endpoints
                .huggingface_url
                .clone()
                .unwrap_or(defaults.huggingface),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".chatrun").join("config.toml")
}
