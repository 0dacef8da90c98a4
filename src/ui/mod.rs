//! User-facing output and prompts.
//!
//! Everything the user reads or answers goes through [`UserInterface`]:
//! - [`TerminalUI`] styles output and asks with dialoguer
//! - [`NonInteractiveUI`] answers from `KAMEK_PROMPT_<KEY>` or defaults
//! - [`MockUI`] records events and answers from a script
//!
//! Diagnostics that only matter when debugging go through `tracing` instead.
//!
//! # Example
//!
//! ```
//! use kamek::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("Toolchain check");
//! ui.success("Python 3.12.4");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, SpinnerStatus, UiEvent};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::prompt_user;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{colors_enabled, KamekTheme};

use crate::error::Result;
use crate::toolchain::Advisory;

/// Output sink and question source for commands and the upgrade workflow.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Plain progress text.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Shown in every output mode.
    fn error(&mut self, msg: &str);

    /// A suggested next action.
    fn show_hint(&mut self, hint: &str);

    /// A non-blocking observation from detection or resolution.
    fn advisory(&mut self, advisory: &Advisory) {
        self.warning(&advisory.message);
    }

    /// Ask a question. Unanswerable prompts are `UserAborted`.
    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn show_header(&mut self, title: &str);
}

/// A running step started with [`UserInterface::start_spinner`].
pub trait SpinnerHandle {
    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);
}

/// A question for the user.
///
/// `key` names the question for `KAMEK_PROMPT_<KEY>` overrides and scripted
/// test answers; it should stay stable across releases.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub key: String,
    pub question: String,
    pub prompt_type: PromptType,
    /// Answer used when the user just presses enter.
    pub default: Option<String>,
}

impl Prompt {
    /// A yes/no question with no default.
    pub fn confirm(key: &str, question: impl Into<String>) -> Self {
        Self::new(key, question, PromptType::Confirm)
    }

    /// A free-form answer (paths, mostly) with no default.
    pub fn input(key: &str, question: impl Into<String>) -> Self {
        Self::new(key, question, PromptType::Input)
    }

    fn new(key: &str, question: impl Into<String>, prompt_type: PromptType) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            prompt_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Name of the environment variable that answers this prompt.
    pub fn override_var(&self) -> String {
        format!("KAMEK_PROMPT_{}", self.key.to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptType {
    Confirm,
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Bool(bool),
    String(String),
}

impl PromptResult {
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Strings are read as yes/no answers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => parse_yes_no(s),
        }
    }
}

/// Read a yes/no answer. Unrecognised input is `None`.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
