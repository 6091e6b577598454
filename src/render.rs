//! Output rendering for streamed replies.
//!
//! The client never prints.  Every fragment of a streamed reply is handed to a
//! [`Renderer`] the moment it is decoded.  A renderer may also carry the
//! [`Interrupt`] that lets the user abandon a reply mid-flight.

use std::io::{self, Stdout, Write};

use crate::interrupt::Interrupt;

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering streaming output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing fragments in memory (tests, batch use)
pub trait Renderer: Send {
    /// Called once before the first fragment of a reply.
    fn start_response(&mut self) {}

    /// Print a chunk of response text.
    ///
    /// This is called incrementally, in arrival order, as fragments are decoded.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a reply is complete.
    fn finish_response(&mut self) {}

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// The interrupt requests should race against, if any.
    fn interrupt(&self) -> Option<Interrupt> {
        None
    }

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        self.interrupt().is_some_and(|i| i.is_triggered())
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    label: Option<String>,
    interrupt: Option<Interrupt>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            label: None,
            interrupt: None,
        }
    }

    /// Prefix every reply with `label`, e.g. `"AI > "`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches an interrupt to the renderer.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        if let Some(label) = &self.label {
            if self.use_color {
                print!("{ANSI_GREEN}{label}{ANSI_RESET}");
            } else {
                print!("{label}");
            }
            self.flush();
        }
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        println!("\n[interrupted]");
        self.flush();
    }

    fn interrupt(&self) -> Option<Interrupt> {
        self.interrupt.clone()
    }
}

/// Renderer that keeps every fragment in memory and prints nothing.
///
/// Useful for batch callers and for asserting on what a stream emitted.
#[derive(Debug, Default, Clone)]
pub struct CollectingRenderer {
    /// Fragments in the order they were emitted.
    pub fragments: Vec<String>,
    /// Errors reported through the renderer.
    pub errors: Vec<String>,
    /// Informational lines reported through the renderer.
    pub info: Vec<String>,
    /// Number of completed responses.
    pub responses: usize,
    /// Whether an interrupt was reported.
    pub interrupted: bool,
    interrupt_after: Option<usize>,
    signal: Option<Interrupt>,
}

impl CollectingRenderer {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for an interrupt once `fragments` fragments have been emitted.
    pub fn interrupt_after(fragments: usize) -> Self {
        Self {
            interrupt_after: Some(fragments),
            ..Self::default()
        }
    }

    /// Race requests against `signal`.
    pub fn with_interrupt(mut self, signal: Interrupt) -> Self {
        self.signal = Some(signal);
        self
    }

    /// All emitted fragments joined together.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

impl Renderer for CollectingRenderer {
    fn print_text(&mut self, text: &str) {
        self.fragments.push(text.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.info.push(info.to_string());
    }

    fn finish_response(&mut self) {
        self.responses += 1;
    }

    fn print_interrupted(&mut self) {
        self.interrupted = true;
    }

    fn interrupt(&self) -> Option<Interrupt> {
        self.signal.clone()
    }

    fn should_interrupt(&self) -> bool {
        self.interrupt_after
            .is_some_and(|limit| self.fragments.len() >= limit)
            || self.signal.as_ref().is_some_and(|s| s.is_triggered())
    }
}
