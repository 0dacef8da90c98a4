//! How much kamek prints.

/// Verbosity chosen from `--verbose` / `--quiet`.
///
/// Errors are always shown. `--json` output is printed directly by the
/// commands and is not governed by the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Verbose,
    #[default]
    Normal,
    /// Spinners, results, warnings.
    Quiet,
    /// Errors only.
    Silent,
}

impl OutputMode {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Self::Quiet,
            (true, false) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    pub fn shows_spinners(&self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Results, warnings, advisories, hints.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Progress narration and headers.
    pub fn shows_messages(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }
}
