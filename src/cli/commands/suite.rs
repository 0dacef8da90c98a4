//! Suite command implementation.
//!
//! The `kamek suite` command inspects the devkitPro installation and can
//! fetch its updater or persist its environment variables.

use serde::Serialize;

use crate::cli::args::SuiteArgs;
use crate::error::{KamekError, Result};
use crate::shell::{EnvScope, EnvWrite};
use crate::toolchain::{CompilerSuiteReport, SuiteInstallAction, SuiteInstaller, ToolchainDetector};
use crate::ui::UserInterface;

use super::check::Problem;
use super::dispatcher::{Command, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct SuiteStatus {
    compiler_suite: Option<CompilerSuiteReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<Problem>,
}

/// The suite command implementation.
pub struct SuiteCommand {
    args: SuiteArgs,
}

impl SuiteCommand {
    /// Create a new suite command.
    pub fn new(args: SuiteArgs) -> Self {
        Self { args }
    }

    fn installer<'a>(&self, ctx: &'a CommandContext<'a>) -> SuiteInstaller<'a> {
        SuiteInstaller::new(
            ctx.fetcher,
            ctx.runner,
            ctx.env,
            &ctx.download_dir(),
            &ctx.paths.tools_dir(),
        )
        .with_layout(ctx.config.devkitpro.layout.clone())
    }

    fn install(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<bool> {
        let url = self
            .args
            .url
            .clone()
            .unwrap_or_else(|| ctx.config.devkitpro.updater_url.clone());

        ui.message(&format!("Downloading {}", url));
        let outcome = match self.installer(ctx).install(&url) {
            Ok(outcome) => outcome,
            Err(e) => {
                ui.error(&e.to_string());
                ui.show_hint("Check your connection, or pass --url with a mirror");
                return Ok(false);
            }
        };

        ui.success(&format!(
            "Downloaded {} ({} bytes)",
            outcome.installer.path.display(),
            outcome.installer.bytes
        ));
        ui.show_hint(&format!("SHA-256: {}", outcome.installer.sha256));

        match &outcome.action {
            SuiteInstallAction::Launched { exit_code } => ui.message(&format!(
                "The updater exited with {}; re-run `kamek suite` to confirm the install",
                exit_code.map_or("no code".to_string(), |c| format!("code {}", c))
            )),
            SuiteInstallAction::Extracted { dir, files } => {
                ui.success(&format!("Extracted {} files into {}", files, dir.display()))
            }
            SuiteInstallAction::ManualRun { .. } => {}
        }
        for step in &outcome.next_steps {
            ui.show_hint(step);
        }
        Ok(true)
    }

    fn set_env(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<bool> {
        let Some(root) = &self.args.set_env else {
            return Ok(true);
        };
        let scope = if self.args.system {
            EnvScope::System
        } else {
            EnvScope::User
        };

        let writes = match self.installer(ctx).persist_env(root, scope) {
            Ok(writes) => writes,
            Err(e @ KamekError::PrivilegeRequired { .. }) => {
                ui.error(&e.to_string());
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let layout = &ctx.config.devkitpro.layout;
        for (name, write) in [&layout.env_var, &layout.compiler_env_var]
            .into_iter()
            .zip(writes)
        {
            match write {
                EnvWrite::Applied => ui.success(&format!("Set {}", name)),
                EnvWrite::ManualStepRequired { instruction } => ui.show_hint(&instruction),
            }
        }
        ui.message("Open a new terminal for the change to take effect");
        Ok(true)
    }
}

impl Command for SuiteCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let mut ok = true;
        if self.args.install {
            ok &= self.install(ui, ctx)?;
        }
        if self.args.set_env.is_some() {
            ok &= self.set_env(ui, ctx)?;
        }

        let detector = ToolchainDetector::new(ctx.runner, ctx.env, ctx.platform)
            .with_layout(ctx.config.devkitpro.layout.clone());
        let status = match detector.detect_compiler_suite() {
            Ok(report) => SuiteStatus {
                compiler_suite: Some(report),
                problem: None,
            },
            Err(e) => SuiteStatus {
                compiler_suite: None,
                problem: Some(Problem::from(KamekError::from(e))),
            },
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&status)
                .map_err(|e| KamekError::Other(e.into()))?;
            println!("{}", json);
        } else {
            match (&status.compiler_suite, &status.problem) {
                (Some(report), _) => {
                    ui.success(&format!(
                        "devkitPro at {}",
                        report.location.resolved_path.display()
                    ));
                    for advisory in &report.advisories {
                        ui.advisory(advisory);
                    }
                }
                (None, Some(problem)) => ui.error(&format!("devkitPro: {}", problem.message)),
                (None, None) => {}
            }
        }

        // A just-started install is not expected to be detectable yet.
        let found = status.compiler_suite.is_some() || self.args.install;
        Ok(CommandResult::from_bool(ok && found))
    }
}
