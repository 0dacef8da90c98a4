//! Unattended UI for CI and piped runs.
//!
//! Prompts are answered from `KAMEK_PROMPT_<KEY>` environment variables, then
//! from the prompt's default. A prompt with neither is `UserAborted`, which
//! the upgrade workflow treats like the user declining. Every answer taken
//! is echoed so CI logs show what was decided and why.

use std::collections::HashMap;

use crate::error::{KamekError, Result};
use crate::toolchain::Advisory;

use super::{parse_yes_no, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

const OVERRIDE_PREFIX: &str = "KAMEK_PROMPT_";

/// Where an unattended answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Override,
    Default,
}

pub struct NonInteractiveUI {
    mode: OutputMode,
    overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Collect `KAMEK_PROMPT_*` from the process environment.
    pub fn new(mode: OutputMode) -> Self {
        let overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(OVERRIDE_PREFIX))
            .collect();
        Self::with_overrides(mode, overrides)
    }

    /// Use `overrides` (keyed by full variable name) instead of the environment.
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self { mode, overrides }
    }

    fn answer(&self, prompt: &Prompt) -> Option<(String, Source)> {
        if let Some(value) = self.overrides.get(&prompt.override_var()) {
            return Some((value.clone(), Source::Override));
        }
        prompt.default.clone().map(|d| (d, Source::Default))
    }

    fn echo(&self, prompt: &Prompt, value: &str, source: Source) {
        if !self.mode.shows_messages() {
            return;
        }
        let origin = match source {
            Source::Override => prompt.override_var(),
            Source::Default => "default".to_string(),
        };
        println!("? {} {} ({})", prompt.question, value, origin);
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            println!("  → {}", hint);
        }
    }

    fn advisory(&mut self, advisory: &Advisory) {
        if self.mode.shows_status() {
            eprintln!("⚠ {} [{}]", advisory.message, advisory.code);
        }
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let unanswerable = |detail: &str| KamekError::UserAborted {
            reason: format!(
                "cannot answer '{}' in non-interactive mode ({}); set {}",
                prompt.key,
                detail,
                prompt.override_var()
            ),
        };

        let Some((value, source)) = self.answer(prompt) else {
            return Err(unanswerable("no default value"));
        };

        let result = match prompt.prompt_type {
            PromptType::Confirm => parse_yes_no(&value)
                .map(PromptResult::Bool)
                .ok_or_else(|| unanswerable("value is not yes or no"))?,
            PromptType::Input => PromptResult::String(value.clone()),
        };
        self.echo(prompt, &value, source);
        Ok(result)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_messages() {
            println!("… {}", message);
        }
        Box::new(StatusLine { mode: self.mode })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_messages() {
            println!("\n== {} ==", title);
        }
    }
}

/// Prints only the outcome of a step.
struct StatusLine {
    mode: OutputMode,
}

impl SpinnerHandle for StatusLine {
    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }
}
