//! Terminal styling.

use console::{Style, Term};

/// Styles for each kind of line kamek prints.
#[derive(Debug, Clone)]
pub struct KamekTheme {
    success: Style,
    warning: Style,
    error: Style,
    header: Style,
    hint: Style,
    /// Advisory codes and other secondary text.
    muted: Style,
}

impl Default for KamekTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl KamekTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            header: Style::new().bold().cyan(),
            hint: Style::new().cyan(),
            muted: Style::new().dim(),
        }
    }

    /// Symbols only, for pipes and `--no-color`.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            header: Style::new(),
            hint: Style::new(),
            muted: Style::new(),
        }
    }

    /// Colored when `term` can show color.
    pub fn for_term(term: &Term) -> Self {
        if colors_enabled(term) {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.success.apply_to(format!("✓ {}", msg)).to_string()
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.warning.apply_to(format!("⚠ {}", msg)).to_string()
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.error.apply_to(format!("✗ {}", msg)).to_string()
    }

    pub fn format_hint(&self, msg: &str) -> String {
        self.hint.apply_to(format!("→ {}", msg)).to_string()
    }

    /// `⚠ message [code]`, the code muted.
    pub fn format_advisory(&self, code: &str, msg: &str) -> String {
        format!(
            "{} {}",
            self.format_warning(msg),
            self.muted.apply_to(format!("[{}]", code))
        )
    }

    /// Title over a rule of the same width.
    pub fn format_header(&self, title: &str) -> String {
        let rule = "─".repeat(console::measure_text_width(title));
        format!(
            "{}\n{}",
            self.header.apply_to(title),
            self.muted.apply_to(rule)
        )
    }
}

/// Whether color should be used on `term`.
///
/// `NO_COLOR` (https://no-color.org/) and `--no-color` both switch it off.
pub fn colors_enabled(term: &Term) -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    let enabled = match term.target() {
        console::TermTarget::Stderr => console::colors_enabled_stderr(),
        _ => console::colors_enabled(),
    };
    enabled && term.is_term()
}
