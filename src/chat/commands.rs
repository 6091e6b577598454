//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session and is never sent to the API.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Exit the chat application.
    Quit,

    /// Clear the conversation history, keeping the system prompt.
    Clear,

    /// Show the model and endpoint in use.
    Model,

    /// Show how many messages the history holds.
    History,

    /// Display help information.
    Help,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input starts with `/`, or `None` if it
/// should be sent as a regular message.  Command names are case-insensitive.
///
/// # Examples
///
/// ```
/// # use cheapllm::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/HISTORY"), Some(ChatCommand::History));
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match (command.as_str(), argument) {
        ("quit" | "exit" | "q", _) => ChatCommand::Quit,
        ("clear", _) => ChatCommand::Clear,
        ("model", None) => ChatCommand::Model,
        ("model", Some(_)) => ChatCommand::Invalid(
            "the model is fixed for a session; restart with --model to change it".to_string(),
        ),
        ("history", _) => ChatCommand::History,
        ("help" | "?", _) => ChatCommand::Help,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command} (try /help)")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /model                 Show the current model and endpoint
  /history               Show the number of messages in the history
  /help                  Show this help message
  /quit                  Exit the chat (also /exit, /q)
Press Ctrl-C while a reply is streaming to stop it."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /EXIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_session_commands() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn parse_model() {
        assert_eq!(parse_command("/model"), Some(ChatCommand::Model));
        assert_eq!(parse_command("/model   "), Some(ChatCommand::Model));
        assert!(matches!(
            parse_command("/model gpt-4"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("--model")
        ));
    }

    #[test]
    fn unknown_command() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("/frobnicate")
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command("what about /clear?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/model"));
        assert!(help.contains("/history"));
    }
}
