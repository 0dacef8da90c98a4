//! Required interpreter packages.
//!
//! Each requirement is checked with `pip show` and, when missing, installed
//! with `pip install`. Installs run one at a time against a single
//! interpreter so they never contend for pip's own lock.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::shell::{ProcessRunner, RunOptions};

use super::version::DEFAULT_PROBE_TIMEOUT;

/// Packages the build scripts import.
pub const DEFAULT_REQUIRED_PACKAGES: &[&str] = &["PyYAML", "pyelftools"];

/// Characters that end the distribution name in a requirement specifier.
const SPECIFIER_DELIMITERS: &[&str] = &["==", ">=", "<=", "!=", "~=", "<", ">", "[", ";", " "];

/// Distribution name of a requirement specifier (`PyYAML>=6` → `PyYAML`).
pub fn package_name(spec: &str) -> &str {
    let spec = spec.trim();
    let end = SPECIFIER_DELIMITERS
        .iter()
        .filter_map(|d| spec.find(d))
        .min()
        .unwrap_or(spec.len());
    spec[..end].trim()
}

/// What happened to one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PackageState {
    AlreadyInstalled,
    Missing,
    Installed,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
    pub spec: String,
    pub name: String,
    #[serde(flatten)]
    pub state: PackageState,
}

impl PackageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.state, PackageState::Failed { .. })
    }
}

/// Runs pip for one interpreter.
pub struct PackageInstaller<'a> {
    runner: &'a dyn ProcessRunner,
    interpreter: PathBuf,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, interpreter: &Path) -> Self {
        Self {
            runner,
            interpreter: interpreter.to_path_buf(),
        }
    }

    /// `<interpreter> -m pip <args...>`
    pub fn pip_command(&self, args: &[&str]) -> Vec<String> {
        let mut cmd = vec![
            self.interpreter.to_string_lossy().into_owned(),
            "-m".to_string(),
            "pip".to_string(),
        ];
        cmd.extend(args.iter().map(|a| a.to_string()));
        cmd
    }

    /// Whether `name` is installed. Launch failures count as not installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.runner
            .run(
                &self.pip_command(&["show", name]),
                &RunOptions::probe(DEFAULT_PROBE_TIMEOUT),
            )
            .map(|out| out.success())
            .unwrap_or(false)
    }

    /// Report which requirements are present without installing anything.
    pub fn check(&self, specs: &[String]) -> Vec<PackageOutcome> {
        specs
            .iter()
            .map(|spec| {
                let name = package_name(spec).to_string();
                let state = if self.is_installed(&name) {
                    PackageState::AlreadyInstalled
                } else {
                    PackageState::Missing
                };
                PackageOutcome {
                    spec: spec.clone(),
                    name,
                    state,
                }
            })
            .collect()
    }

    /// Install every requirement that is not already present.
    ///
    /// A failure on one package does not stop the rest.
    pub fn ensure(&self, specs: &[String]) -> Vec<PackageOutcome> {
        self.check(specs)
            .into_iter()
            .map(|mut outcome| {
                if outcome.state == PackageState::Missing {
                    outcome.state = self.install(&outcome.spec);
                }
                outcome
            })
            .collect()
    }

    fn install(&self, spec: &str) -> PackageState {
        tracing::debug!("Installing {}", spec);
        match self
            .runner
            .run(&self.pip_command(&["install", spec]), &RunOptions::streaming())
        {
            Ok(out) if out.success() => PackageState::Installed,
            Ok(out) => PackageState::Failed {
                message: format!(
                    "pip install {} exited with code {}",
                    spec,
                    out.exit_code.map_or("?".to_string(), |c| c.to_string())
                ),
            },
            Err(e) => PackageState::Failed {
                message: e.to_string(),
            },
        }
    }
}
