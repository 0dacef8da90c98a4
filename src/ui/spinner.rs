//! Spinner for blocking probes and downloads.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::KamekTheme;
use super::SpinnerHandle;

/// Spinner drawn on stderr while a step blocks; elapsed time is shown
/// because interpreter probes and pip runs can take a while.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: KamekTheme,
}

impl ProgressSpinner {
    pub fn new(message: &str, theme: KamekTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, theme }
    }

    /// Draws nothing; used in silent mode.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: KamekTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }
}

impl Drop for ProgressSpinner {
    /// A spinner dropped on an early return must not keep ticking.
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
