//! Compiler-suite acquisition.
//!
//! devkitPro is installed by its own updater. This module downloads the
//! updater and hands off to it: native executables are launched with their
//! output streamed, zip archives are unpacked into the tools directory, and
//! anything else (the Java bootstrap) is left for the user to run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::download::{extract_zip, FetchedFile, Fetcher};
use crate::error::{KamekError, Result};
use crate::shell::{EnvAccess, EnvScope, EnvWrite, ProcessRunner, RunOptions};

use super::detector::SuiteLayout;

/// The devkitPro updater bootstrap.
pub const DEFAULT_UPDATER_URL: &str =
    "https://github.com/devkitPro/installer/releases/latest/download/devkitProUpdater-bootstrap.jar";

/// Where platform-specific installers are listed.
pub const GETTING_STARTED_URL: &str = "https://devkitpro.org/wiki/Getting_Started";

/// What was done with the downloaded updater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuiteInstallAction {
    /// A native installer ran; its exit code is not a reliable success signal.
    Launched { exit_code: Option<i32> },
    /// A zip archive was unpacked.
    Extracted { dir: PathBuf, files: usize },
    /// The user has to run the file themselves.
    ManualRun { path: PathBuf },
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteInstallOutcome {
    pub installer: FetchedFile,
    pub action: SuiteInstallAction,
    pub next_steps: Vec<String>,
}

/// Downloads and hands off to the compiler suite's updater.
pub struct SuiteInstaller<'a> {
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn ProcessRunner,
    env: &'a dyn EnvAccess,
    layout: SuiteLayout,
    download_dir: PathBuf,
    tools_dir: PathBuf,
}

impl<'a> SuiteInstaller<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        runner: &'a dyn ProcessRunner,
        env: &'a dyn EnvAccess,
        download_dir: &Path,
        tools_dir: &Path,
    ) -> Self {
        Self {
            fetcher,
            runner,
            env,
            layout: SuiteLayout::default(),
            download_dir: download_dir.to_path_buf(),
            tools_dir: tools_dir.to_path_buf(),
        }
    }

    pub fn with_layout(mut self, layout: SuiteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Download `url` and act on it according to its file type.
    pub fn install(&self, url: &str) -> Result<SuiteInstallOutcome> {
        let name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("devkitpro-updater");
        let dest = self.download_dir.join(name);

        let installer = self
            .fetcher
            .fetch(url, &dest)
            .map_err(|e| KamekError::external("download devkitPro updater", format!("{:#}", e)))?;

        let extension = dest
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let action = match extension.as_str() {
            "exe" => {
                tracing::debug!("Launching {}", dest.display());
                let cmd = vec![dest.to_string_lossy().into_owned()];
                let output = self
                    .runner
                    .run(&cmd, &RunOptions::streaming())
                    .map_err(|e| KamekError::external("run devkitPro updater", e.to_string()))?;
                SuiteInstallAction::Launched {
                    exit_code: output.exit_code,
                }
            }
            "zip" => {
                let files = extract_zip(&dest, &self.tools_dir).map_err(|e| {
                    KamekError::external("extract devkitPro archive", format!("{:#}", e))
                })?;
                SuiteInstallAction::Extracted {
                    dir: self.tools_dir.clone(),
                    files,
                }
            }
            _ => SuiteInstallAction::ManualRun { path: dest.clone() },
        };

        let mut next_steps = Vec::new();
        if let SuiteInstallAction::ManualRun { path } = &action {
            if extension == "jar" {
                next_steps.push(format!("Run the updater: java -jar \"{}\"", path.display()));
            } else {
                next_steps.push(format!("Run {} following your platform's instructions", path.display()));
            }
            next_steps.push(format!("Platform installers are listed at {}", GETTING_STARTED_URL));
        }
        next_steps.push(format!(
            "Make sure {} is set and {} is on PATH, then restart your terminal",
            self.layout.env_var, self.layout.runtime_bin
        ));

        Ok(SuiteInstallOutcome {
            installer,
            action,
            next_steps,
        })
    }

    /// Persist the suite root and compiler directory variables.
    ///
    /// Stops at the first write that needs privileges the process lacks.
    pub fn persist_env(&self, root: &Path, scope: EnvScope) -> Result<Vec<EnvWrite>> {
        let root_value = root.to_string_lossy().into_owned();
        let compiler_value = root
            .join(&self.layout.compiler_dir)
            .to_string_lossy()
            .into_owned();

        let mut writes = Vec::new();
        writes.push(self.env.set_persistent(&self.layout.env_var, &root_value, scope)?);
        writes.push(
            self.env
                .set_persistent(&self.layout.compiler_env_var, &compiler_value, scope)?,
        );
        Ok(writes)
    }
}
