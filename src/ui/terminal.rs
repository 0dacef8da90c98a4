//! Interactive terminal UI.

use std::io::{IsTerminal, Write};

use console::Term;

use crate::error::Result;
use crate::toolchain::Advisory;

use super::{
    prompt_user, KamekTheme, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt, PromptResult,
    SpinnerHandle, UserInterface,
};

/// Styled output for a user at a terminal.
///
/// Progress and results go to stdout; warnings, advisories, and errors go
/// to stderr so `--json` output piped from stdout stays parseable.
pub struct TerminalUI {
    out: Term,
    err: Term,
    out_theme: KamekTheme,
    err_theme: KamekTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        let out = Term::stdout();
        let err = Term::stderr();
        Self {
            out_theme: KamekTheme::for_term(&out),
            err_theme: KamekTheme::for_term(&err),
            out,
            err,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.out_theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.err_theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.err_theme.format_error(msg)).ok();
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "  {}", self.out_theme.format_hint(hint)).ok();
        }
    }

    fn advisory(&mut self, advisory: &Advisory) {
        if self.mode.shows_status() {
            let line = self
                .err_theme
                .format_advisory(&advisory.code, &advisory.message);
            writeln!(self.err, "{}", line).ok();
        }
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        tracing::debug!("Prompting for '{}'", prompt.key);
        prompt_user(prompt, &self.err)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.err_theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_messages() {
            writeln!(self.out, "\n{}", self.out_theme.format_header(title)).ok();
        }
    }
}

/// Pick the UI for this run.
///
/// Prompting needs a terminal on both stdin and stdout; anything else gets
/// [`NonInteractiveUI`] even when `interactive` is requested.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    let attended = std::io::stdin().is_terminal() && Term::stdout().is_term();
    if interactive && attended {
        Box::new(TerminalUI::new(mode))
    } else {
        tracing::debug!("Using non-interactive UI (requested: {}, attended: {})", interactive, attended);
        Box::new(NonInteractiveUI::new(mode))
    }
}
