use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl LlmError {
    /// Map a non-success provider reply onto the error taxonomy.
    pub(crate) fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("{provider} status={status} body={body}");
        match status.as_u16() {
            401 | 403 => Self::Authentication(detail),
            404 => Self::InvalidModel(detail),
            400 | 422 if names_unknown_model(body) => Self::InvalidModel(detail),
            408 | 429 => Self::ProviderUnavailable(detail),
            _ if status.is_server_error() => Self::ProviderUnavailable(detail),
            _ => Self::Http(detail),
        }
    }
}

/// Unknown-model wording used by the Anthropic and Hugging Face APIs. A bare
/// mention of "model" is not enough: context-length errors mention it too.
fn names_unknown_model(body: &str) -> bool {
    const UNKNOWN: &[&str] = &[
        "not supported",
        "does not exist",
        "not found",
        "unknown model",
        "invalid model",
    ];
    let body = body.to_ascii_lowercase();
    if body.contains("not_found_error") {
        return true;
    }
    body.contains("model") && UNKNOWN.iter().any(|phrase| body.contains(phrase))
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::ResponseFormat(e.to_string());
        }
        if e.is_builder() {
            return Self::InvalidInput(e.to_string());
        }
        Self::ProviderUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}
