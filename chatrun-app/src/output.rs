use chatrun_llm::ChatResponse;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Only the reply text.
    Text,
    /// The whole message the provider returned.
    Message,
    /// The normalized response (text, model, usage, finish reason, raw payload).
    Json,
}

pub fn render(resp: &ChatResponse, mode: OutputMode) -> anyhow::Result<String> {
    let out = match mode {
        OutputMode::Text => resp.text.clone(),
        OutputMode::Message => serde_json::to_string_pretty(&resp.raw)?,
        OutputMode::Json => serde_json::to_string_pretty(resp)?,
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrun_llm::Usage;
    use serde_json::json;

    fn response() -> ChatResponse {
        ChatResponse {
            text: "New Delhi".to_string(),
            model: "deepseek-ai/DeepSeek-R1".to_string(),
            usage: Usage {
                prompt_tokens: 9,
                completion_tokens: 3,
            },
            finish_reason: "stop".to_string(),
            raw: json!({ "choices": [{ "message": { "content": "New Delhi" } }] }),
        }
    }

    #[test]
    fn text_mode_prints_only_text() {
        assert_eq!(
            render(&response(), OutputMode::Text).expect("renders"),
            "New Delhi"
        );
    }

    #[test]
    fn message_mode_prints_raw_payload() {
        let out = render(&response(), OutputMode::Message).expect("renders");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed, response().raw);
    }

    #[test]
    fn json_mode_includes_usage() {
        let out = render(&response(), OutputMode::Json).expect("renders");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed["text"], "New Delhi");
        assert_eq!(parsed["usage"]["completion_tokens"], 3);
        assert_eq!(parsed["finish_reason"], "stop");
    }
}
