use crate::error::UnfollowerError;
use dialoguer::console::Term;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Answer to the per-account `(y/n/all/quit)` prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Accept,
    AcceptAll,
    Decline,
    Quit,
}

impl Directive {
    /// Case-insensitive; anything unrecognized declines.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Directive::Accept,
            "all" | "a" => Directive::AcceptAll,
            "quit" | "q" => Directive::Quit,
            _ => Directive::Decline,
        }
    }
}

/// Only an explicit `yes`/`y` confirms.
pub fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y")
}

/// The user-facing side of a run: prompts, secrets, and progress.
pub trait Console {
    fn read_line(&mut self, prompt: &str) -> Result<String, UnfollowerError>;
    /// Read without echoing the input.
    fn read_secret(&mut self, prompt: &str) -> Result<String, UnfollowerError>;
    fn say(&mut self, message: &str);
    fn begin_task(&mut self, message: &str);
    fn end_task(&mut self);
}

/// Interactive terminal console. Prompts, messages and the spinner all go to
/// stdout; stderr is left to logging.
pub struct TerminalConsole {
    term: Term,
    spinner: Option<ProgressBar>,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self {
            term: Term::stdout(),
            spinner: None,
        }
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, UnfollowerError> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text_on(&self.term)?;
        Ok(answer)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String, UnfollowerError> {
        let secret = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact_on(&self.term)?;
        Ok(secret)
    }

    fn say(&mut self, message: &str) {
        match &self.spinner {
            Some(spinner) => spinner.println(message),
            None => println!("{message}"),
        }
    }

    fn begin_task(&mut self, message: &str) {
        self.end_task();

        // Only animate when the prompt stream is a terminal
        if !self.term.is_term() {
            println!("{message}");
            return;
        }

        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn end_task(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parsing() {
        assert_eq!(Directive::parse("y"), Directive::Accept);
        assert_eq!(Directive::parse("YES"), Directive::Accept);
        assert_eq!(Directive::parse(" all "), Directive::AcceptAll);
        assert_eq!(Directive::parse("a"), Directive::AcceptAll);
        assert_eq!(Directive::parse("Quit"), Directive::Quit);
        assert_eq!(Directive::parse("q"), Directive::Quit);
        assert_eq!(Directive::parse("n"), Directive::Decline);
        assert_eq!(Directive::parse(""), Directive::Decline);
        assert_eq!(Directive::parse("maybe"), Directive::Decline);
    }

    #[test]
    fn test_confirmation_parsing() {
        assert!(parse_confirmation("yes"));
        assert!(parse_confirmation("Y"));
        assert!(parse_confirmation("  yes\n"));
        assert!(!parse_confirmation("no"));
        assert!(!parse_confirmation(""));
        assert!(!parse_confirmation("yeah"));
        assert!(!parse_confirmation("all"));
    }

    #[test]
    fn test_end_task_without_spinner_is_noop() {
        let mut console = TerminalConsole::new();
        console.end_task();
        assert!(console.spinner.is_none());
    }

    #[test]
    fn test_terminal_console_prompts_on_stdout() {
        let console = TerminalConsole::new();
        assert!(matches!(
            console.term.target(),
            dialoguer::console::TermTarget::Stdout
        ));
    }

    #[test]
    fn test_begin_task_without_terminal_prints_plainly() {
        let mut console = TerminalConsole::new();
        if !console.term.is_term() {
            console.begin_task("Fetching...");
            assert!(console.spinner.is_none());
        }
        console.end_task();
        assert!(console.spinner.is_none());
    }
}
