//! chatrun: send one prompt to a hosted chat model and print the reply.

mod config;
mod output;

use chatrun_llm::{HF_DEFAULT_TASK, HF_TASKS, ModelConfig, PromptRunner, Provider};
use clap::{Args, Parser, Subcommand};
use config::ChatrunConfig;
use output::OutputMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "chatrun", version, about = "Send one prompt to a hosted chat model")]
struct Cli {
    /// Config file (default: ~/.chatrun/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask an Anthropic model.
    Anthropic {
        #[arg(long)]
        model: String,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long, value_enum, default_value_t = OutputMode::Message)]
        output: OutputMode,
        #[command(flatten)]
        prompt: PromptArg,
    },
    /// Ask a Hugging Face hosted model through the chat router.
    Hf {
        #[arg(long, default_value = "deepseek-ai/DeepSeek-R1")]
        model: String,
        #[arg(long, default_value = HF_DEFAULT_TASK)]
        task: String,
        #[arg(long, default_value_t = 0.2)]
        temperature: f32,
        #[arg(long, default_value_t = 64)]
        max_tokens: u32,
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        output: OutputMode,
        #[command(flatten)]
        prompt: PromptArg,
    },
    /// Show which credentials and endpoints are configured.
    Doctor,
}

#[derive(Debug, Args)]
struct PromptArg {
    /// Prompt text; words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
}

impl PromptArg {
    fn text(&self) -> String {
        self.prompt.join(" ")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(anyhow::anyhow!("load .env: {e}"));
        }
    }
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let cfg = ChatrunConfig::load(cli.config).await?;

    match cli.command {
        Command::Anthropic {
            model,
            temperature,
            max_tokens,
            output,
            prompt,
        } => {
            let mut model_cfg = ModelConfig::new(Provider::AnthropicStyle, model);
            if let Some(t) = temperature {
                model_cfg = model_cfg.with_temperature(t);
            }
            if let Some(n) = max_tokens {
                model_cfg = model_cfg.with_max_tokens(n);
            }
            ask(&cfg, &model_cfg, &prompt.text(), output).await
        }
        Command::Hf {
            model,
            task,
            temperature,
            max_tokens,
            output,
            prompt,
        } => {
            let model_cfg = ModelConfig::new(Provider::HfEndpoint, model)
                .with_task(task)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens);
            ask(&cfg, &model_cfg, &prompt.text(), output).await
        }
        Command::Doctor => {
            doctor(&cfg);
            Ok(())
        }
    }
}

async fn ask(
    cfg: &ChatrunConfig,
    model_cfg: &ModelConfig,
    prompt: &str,
    output: OutputMode,
) -> anyhow::Result<()> {
    let runner = PromptRunner::with_endpoints(cfg.credentials(), cfg.endpoints());
    let resp = runner.run(model_cfg, prompt).await?;
    println!("{}", output::render(&resp, output)?);
    Ok(())
}

fn doctor(cfg: &ChatrunConfig) {
    let creds = cfg.credentials();
    let endpoints = cfg.endpoints();
    for (provider, url) in [
        (Provider::AnthropicStyle, &endpoints.anthropic),
        (Provider::HfEndpoint, &endpoints.huggingface),
    ] {
        let key = if creds.key_for(provider).is_some() {
            "set"
        } else {
            "missing"
        };
        println!("{provider}: key={key} endpoint={url}");
    }
    println!("huggingface tasks: {}", HF_TASKS.join(", "));
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("warn,chatrun=info,chatrun_llm=info"),
    };
    let log_format = std::env::var("CHATRUN_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // stdout carries the reply; logs go to stderr.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported CHATRUN_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hf_subcommand_has_deepseek_defaults() {
        let cli = Cli::try_parse_from(["chatrun", "hf", "What", "is", "the", "capital?"])
            .expect("parses");
        match cli.command {
            Command::Hf {
                model,
                task,
                temperature,
                max_tokens,
                output,
                prompt,
            } => {
                assert_eq!(model, "deepseek-ai/DeepSeek-R1");
                assert_eq!(task, "conversational");
                assert_eq!(temperature, 0.2);
                assert_eq!(max_tokens, 64);
                assert_eq!(output, OutputMode::Text);
                assert_eq!(prompt.text(), "What is the capital?");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn anthropic_requires_model_and_prints_message() {
        assert!(Cli::try_parse_from(["chatrun", "anthropic", "hi"]).is_err());

        let cli = Cli::try_parse_from([
            "chatrun",
            "--config",
            "/tmp/c.toml",
            "anthropic",
            "--model",
            "model_name",
            "What is the capital of India",
        ])
        .expect("parses");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        match cli.command {
            Command::Anthropic { model, output, temperature, .. } => {
                assert_eq!(model, "model_name");
                assert_eq!(output, OutputMode::Message);
                assert_eq!(temperature, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let s: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_payload_to_string(s.as_ref()), "boom");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_payload_to_string(s.as_ref()), "bang");
        let s: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_payload_to_string(s.as_ref()), "non-string panic payload");
    }
}
