//! Manage cheapllm settings.
//!
//! # Usage
//!
//! ```bash
//! cheapllm-config init                      # pick a provider interactively
//! cheapllm-config show                      # print settings, key masked
//! cheapllm-config set model deepseek-chat   # change one setting
//! cheapllm-config providers                 # list known providers
//! ```

use std::borrow::Cow;
use std::process::ExitCode;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use rustyline::completion::Completer;
use rustyline::config::Configurer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{ColorMode, DefaultEditor, Editor, Helper};

use cheapllm::config::{DEFAULT_MODEL, SETTING_KEYS, is_local_endpoint, mask_secret};
use cheapllm::{ConfigStore, providers};

const USAGE: &str = "cheapllm-config [OPTIONS] init|show|set KEY VALUE|providers";

/// Command-line options for cheapllm-config.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct ConfigArgs {
    #[arrrg(optional, "Settings file (default: ~/.cheapllm/config.json)", "PATH")]
    config: Option<String>,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (args, free) = ConfigArgs::from_command_line_relaxed(USAGE);
    let store = ConfigStore::open(args.config.as_deref())?;
    let free: Vec<&str> = free.iter().map(String::as_str).collect();

    match free.as_slice() {
        ["init"] => init(&store)?,
        ["show"] => show(&store),
        ["set", key, value] => {
            if let Err(err) = store.set(key, value) {
                eprintln!("Error: {err}");
                return Ok(ExitCode::FAILURE);
            }
            let display = if *key == "api_key" {
                mask_secret(value)
            } else {
                value.to_string()
            };
            println!("Set {key} = {display}");
        }
        ["providers"] => list_providers(),
        _ => {
            eprintln!("usage: {USAGE}");
            eprintln!("settable keys: {}", SETTING_KEYS.join(", "));
            return Ok(ExitCode::from(2));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn init(store: &ConfigStore) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;
    let known = providers::list();

    println!("Available providers:");
    for (i, provider) in known.iter().enumerate() {
        println!("  {}. {:15} {}", i + 1, provider.name, provider.description);
    }
    println!(
        "  {}. {:15} {}",
        known.len() + 1,
        "custom",
        "Any other OpenAI-compatible API"
    );

    let choice = prompt(&mut rl, "\nSelect a provider (number or name)", "1")?;
    let selected = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| known.get(n))
        .or_else(|| providers::lookup(&choice));

    let (base_url, model) = match selected {
        Some(provider) => {
            println!("Selected: {provider}");
            (provider.base_url.to_string(), provider.default_model.to_string())
        }
        None => {
            let base_url = prompt(&mut rl, "API base URL", "https://api.openai.com/v1")?;
            let model = prompt(&mut rl, "Model name", DEFAULT_MODEL)?;
            (base_url, model)
        }
    };

    let api_key = if is_local_endpoint(&base_url) {
        println!("(local server, no API key needed)");
        String::new()
    } else {
        prompt_secret("API key")?
    };

    let mut settings = store.load();
    settings.set("base_url", &base_url)?;
    settings.set("model", &model)?;
    settings.set("api_key", &api_key)?;
    store.save(&settings)?;

    println!("\nSettings saved to {}", store.path().display());
    println!("  base_url: {}", settings.base_url);
    println!("  model: {}", settings.model);
    println!("\nTry:");
    println!("  cheapllm-ask \"hello\"");
    println!("  cheapllm-chat");
    Ok(())
}

fn show(store: &ConfigStore) {
    let settings = store.load();
    println!("Current settings:");
    for (key, value) in settings.display_entries() {
        println!("  {key}: {value}");
    }
    println!("\nSettings file: {}", store.path().display());
    if !settings.with_env_overrides().is_configured() {
        println!("Not configured yet; run `cheapllm-config init`.");
    }
}

fn list_providers() {
    println!("Known providers (all OpenAI-compatible):\n");
    for provider in providers::list() {
        println!("  {:15} {}", provider.name, provider.description);
        println!("  {:15} base_url: {}", "", provider.base_url);
        println!("  {:15} model: {}", "", provider.default_model);
        if provider.is_local() {
            println!("  {:15} runs locally, no API key needed", "");
        }
        println!();
    }
}

fn prompt(
    rl: &mut DefaultEditor,
    label: &str,
    default: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let text = if default.is_empty() {
        format!("{label}: ")
    } else {
        format!("{label} [{default}]: ")
    };
    let line = rl.readline(&text)?;
    let line = line.trim();
    Ok(if line.is_empty() {
        default.to_string()
    } else {
        line.to_string()
    })
}

/// Draws every typed character as `*` so a secret never reaches the screen.
struct SecretMask;

impl Completer for SecretMask {
    type Candidate = String;
}

impl Hinter for SecretMask {
    type Hint = String;
}

impl Validator for SecretMask {}

impl Highlighter for SecretMask {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, kind: CmdKind) -> bool {
        !matches!(kind, CmdKind::MoveCursor)
    }
}

impl Helper for SecretMask {}

fn prompt_secret(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut rl: Editor<SecretMask, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(SecretMask));
    // Masking is drawn through the highlighter, which only runs with color on.
    rl.set_color_mode(ColorMode::Forced);
    rl.set_auto_add_history(false);
    let line = rl.readline(&format!("{label}: "))?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_mask_hides_every_character() {
        let mask = SecretMask;
        assert_eq!(mask.highlight("sk-abc123", 3), "*********");
        assert_eq!(mask.highlight("", 0), "");
        assert_eq!(mask.highlight("ключ", 2), "****");
        assert!(mask.highlight_char("sk", 1, CmdKind::Other));
        assert!(!mask.highlight_char("sk", 1, CmdKind::MoveCursor));
    }
}
