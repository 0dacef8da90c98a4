//! Scripted UI for tests.
//!
//! `MockUI` records everything shown as an ordered list of [`UiEvent`]s and
//! answers prompts from a script, so whole workflows can run without a
//! terminal.
//!
//! # Example
//!
//! ```
//! use kamek::ui::{MockUI, Prompt, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("continue_without_migration", "no");
//!
//! ui.message("Snapshotting packages");
//! let answer = ui
//!     .prompt(&Prompt::confirm("continue_without_migration", "Continue?"))
//!     .unwrap();
//!
//! assert_eq!(answer.as_bool(), Some(false));
//! assert!(ui.has_message("Snapshotting"));
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::{KamekError, Result};
use crate::toolchain::Advisory;

use super::{parse_yes_no, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// One thing the code under test showed or asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Header(String),
    Message(String),
    Success(String),
    Warning(String),
    Error(String),
    Hint(String),
    Advisory { code: String, message: String },
    Spinner(String),
    /// The prompt key.
    Prompt(String),
}

/// Records output and answers prompts from a script.
///
/// Answer order for a key: queued answers first, then the fixed answer set
/// with [`MockUI::set_prompt_response`], then the prompt's own default.
/// With none of those the prompt fails as `UserAborted`, like an unattended
/// run would.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    events: Vec<UiEvent>,
    queued: HashMap<String, VecDeque<String>>,
    fixed: HashMap<String, String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Answer every `key` prompt with `response`.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.fixed.insert(key.to_string(), response.to_string());
    }

    /// Answer the next `key` prompts with `responses`, in order.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        self.queued
            .entry(key.to_string())
            .or_default()
            .extend(responses.into_iter().map(String::from));
    }

    pub fn events(&self) -> &[UiEvent] {
        &self.events
    }

    pub fn headers(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                UiEvent::Header(title) => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Codes of advisories shown, in order.
    pub fn advisory_codes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                UiEvent::Advisory { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect()
    }

    /// How many times the prompt `key` was asked.
    pub fn prompt_count(&self, key: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, UiEvent::Prompt(k) if k == key))
            .count()
    }

    pub fn has_message(&self, text: &str) -> bool {
        self.any(|e| matches!(e, UiEvent::Message(m) if m.contains(text)))
    }

    pub fn has_success(&self, text: &str) -> bool {
        self.any(|e| matches!(e, UiEvent::Success(m) if m.contains(text)))
    }

    /// Matches plain warnings and advisory messages.
    pub fn has_warning(&self, text: &str) -> bool {
        self.any(|e| match e {
            UiEvent::Warning(m) => m.contains(text),
            UiEvent::Advisory { message, .. } => message.contains(text),
            _ => false,
        })
    }

    pub fn has_error(&self, text: &str) -> bool {
        self.any(|e| matches!(e, UiEvent::Error(m) if m.contains(text)))
    }

    pub fn has_hint(&self, text: &str) -> bool {
        self.any(|e| matches!(e, UiEvent::Hint(m) if m.contains(text)))
    }

    fn any(&self, pred: impl Fn(&UiEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }

    fn scripted_answer(&mut self, prompt: &Prompt) -> Option<String> {
        self.queued
            .get_mut(&prompt.key)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.fixed.get(&prompt.key).cloned())
            .or_else(|| prompt.default.clone())
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.events.push(UiEvent::Message(msg.to_string()));
    }

    fn success(&mut self, msg: &str) {
        self.events.push(UiEvent::Success(msg.to_string()));
    }

    fn warning(&mut self, msg: &str) {
        self.events.push(UiEvent::Warning(msg.to_string()));
    }

    fn error(&mut self, msg: &str) {
        self.events.push(UiEvent::Error(msg.to_string()));
    }

    fn show_hint(&mut self, hint: &str) {
        self.events.push(UiEvent::Hint(hint.to_string()));
    }

    fn advisory(&mut self, advisory: &Advisory) {
        self.events.push(UiEvent::Advisory {
            code: advisory.code.clone(),
            message: advisory.message.clone(),
        });
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.events.push(UiEvent::Prompt(prompt.key.clone()));

        let answer = self
            .scripted_answer(prompt)
            .ok_or_else(|| KamekError::UserAborted {
                reason: format!("no response scripted for '{}'", prompt.key),
            })?;

        Ok(match prompt.prompt_type {
            PromptType::Confirm => PromptResult::Bool(parse_yes_no(&answer).unwrap_or(false)),
            PromptType::Input => PromptResult::String(answer),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.events.push(UiEvent::Spinner(message.to_string()));
        Box::new(MockSpinner::default())
    }

    fn show_header(&mut self, title: &str) {
        self.events.push(UiEvent::Header(title.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    Success,
    Error,
}

/// Spinner that remembers how it finished.
#[derive(Debug, Default)]
pub struct MockSpinner {
    finished: Option<(SpinnerStatus, String)>,
}

impl MockSpinner {
    pub fn status(&self) -> Option<SpinnerStatus> {
        self.finished.as_ref().map(|(status, _)| *status)
    }

    pub fn finish_message(&self) -> Option<&str> {
        self.finished.as_ref().map(|(_, msg)| msg.as_str())
    }
}

impl SpinnerHandle for MockSpinner {
    fn finish_success(&mut self, msg: &str) {
        self.finished = Some((SpinnerStatus::Success, msg.to_string()));
    }

    fn finish_error(&mut self, msg: &str) {
        self.finished = Some((SpinnerStatus::Error, msg.to_string()));
    }
}
