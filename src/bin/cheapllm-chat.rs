//! Interactive multi-turn chat.
//!
//! # Usage
//!
//! ```bash
//! # Use the configured model and system prompt
//! cheapllm-chat
//!
//! # Override either for this session
//! cheapllm-chat --model deepseek-chat --system "You are a terse reviewer"
//!
//! # Disable colors (useful for piping output)
//! cheapllm-chat --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/model` - Show the model and endpoint
//! - `/history` - Show the number of messages kept
//! - `/quit` - Exit the application (also `/exit`, `/q`)
//!
//! Ctrl-C while waiting for or streaming a reply stops it; the interrupted turn
//! is not kept.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use cheapllm::chat::{ChatArgs, ChatCommand, ChatConfig, ChatSession, help_text, parse_command};
use cheapllm::config::SETUP_HINT;
use cheapllm::{ConfigStore, Interrupt, PlainTextRenderer, Renderer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("cheapllm-chat [OPTIONS]");

    let store = ConfigStore::open(args.config.as_deref())?;
    let settings = store.load().with_env_overrides();
    if !settings.is_configured() {
        eprintln!("{SETUP_HINT}");
        std::process::exit(1);
    }

    let config = ChatConfig::from(&settings).with_overrides(args.model, args.system);
    let mut session = ChatSession::new(config)?;

    // Ctrl-C cancels the reply in flight, even while the server is silent
    let interrupt = Interrupt::new();
    let handle = interrupt.clone();
    ctrlc::set_handler(move || handle.trigger())?;

    let mut renderer = PlainTextRenderer::with_color(!args.no_color)
        .with_label("AI > ")
        .with_interrupt(interrupt.clone());
    let mut rl = DefaultEditor::new()?;

    println!("cheapllm chat (model: {})", session.model());
    println!("Type /help for commands, /exit to quit\n");

    loop {
        interrupt.reset();

        match rl.readline("You > ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear_history();
                            renderer.print_info("Conversation history cleared.");
                        }
                        ChatCommand::Model => {
                            renderer.print_info(&format!("Model: {}", session.model()));
                            renderer.print_info(&format!("Endpoint: {}", session.base_url()));
                        }
                        ChatCommand::History => {
                            renderer.print_info(&format!(
                                "{} messages in history",
                                session.message_count()
                            ));
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {line}");
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                println!();
                match session.chat(line, true, &mut renderer).await {
                    Ok(_) => println!(),
                    // The renderer has already reported the interrupt.
                    Err(err) if err.is_abort() => {}
                    Err(err) => renderer.print_error(&err.to_string()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}
