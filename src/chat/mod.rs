//! Chat sessions over an OpenAI-compatible endpoint.
//!
//! - [`config`]: CLI argument parsing and the per-session request configuration
//! - [`session`]: conversation history and the `ask`/`chat` operations
//! - [`commands`]: slash command parsing for the interactive chat

mod commands;
mod config;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{AskArgs, ChatArgs, ChatConfig};
pub use session::ChatSession;
