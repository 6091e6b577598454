//! Ask a single question and print the answer.
//!
//! # Usage
//!
//! ```bash
//! cheapllm-ask What is Rust?
//! cheapllm-ask --model gpt-4 "Translate to French: hello world"
//! cheapllm-ask --no-stream "Summarise TCP in one line"
//! ```
//!
//! The question is sent on its own (plus the configured system prompt); no
//! history is kept between invocations.

use std::io::IsTerminal;
use std::process::ExitCode;

use arrrg::CommandLine;

use cheapllm::chat::{AskArgs, ChatConfig, ChatSession};
use cheapllm::config::SETUP_HINT;
use cheapllm::{ConfigStore, PlainTextRenderer, Renderer};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (args, free) = AskArgs::from_command_line_relaxed("cheapllm-ask [OPTIONS] QUESTION...");
    if free.is_empty() {
        eprintln!("usage: cheapllm-ask [OPTIONS] QUESTION...");
        return Ok(ExitCode::from(2));
    }
    let question = free.join(" ");

    let store = ConfigStore::open(args.config.as_deref())?;
    let settings = store.load().with_env_overrides();
    if !settings.is_configured() {
        eprintln!("{SETUP_HINT}");
        return Ok(ExitCode::FAILURE);
    }

    let config = ChatConfig::from(&settings).with_overrides(args.model, None);
    let session = ChatSession::new(config)?;
    let stream = !args.no_stream;
    let mut renderer = PlainTextRenderer::with_color(std::io::stdout().is_terminal());

    match session.ask(&question, stream, &mut renderer).await {
        Ok(answer) => {
            if !stream {
                println!("{answer}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            renderer.print_error(&err.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}
