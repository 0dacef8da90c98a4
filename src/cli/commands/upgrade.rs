//! Upgrade command implementation.
//!
//! The `kamek upgrade` command replaces the Python interpreter and carries
//! its installed packages over.

use crate::cli::args::UpgradeArgs;
use crate::download::{DownloadResolver, OsFilter};
use crate::error::{KamekError, Result};
use crate::toolchain::ToolchainDetector;
use crate::ui::UserInterface;
use crate::upgrade::{SessionStatus, UpgradeOrchestrator, UpgradeReport, UpgradeSettings};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The upgrade command implementation.
pub struct UpgradeCommand {
    args: UpgradeArgs,
}

impl UpgradeCommand {
    /// Create a new upgrade command.
    pub fn new(args: UpgradeArgs) -> Self {
        Self { args }
    }

    /// Merge config and flags into orchestrator settings.
    pub fn settings(&self, ctx: &CommandContext<'_>) -> Result<UpgradeSettings> {
        let python = &ctx.config.python;
        let upgrade = &ctx.config.upgrade;

        let min_version =
            python
                .min_version()
                .ok_or_else(|| KamekError::ConfigParseError {
                    path: ctx.project_root.clone(),
                    message: format!("invalid python.min_version '{}'", python.min_version),
                })?;

        Ok(UpgradeSettings {
            min_version,
            version_token: self
                .args
                .to
                .clone()
                .unwrap_or_else(|| upgrade.version_token.clone()),
            os_filter: self
                .args
                .os
                .clone()
                .or_else(|| upgrade.os_filter.clone())
                .unwrap_or_else(|| OsFilter::for_host().to_string()),
            download_dir: self
                .args
                .download_dir
                .clone()
                .unwrap_or_else(|| ctx.download_dir()),
            max_path_attempts: upgrade.max_path_attempts.max(1),
        })
    }

    /// Run the orchestrator and return its report.
    pub fn run(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<UpgradeReport> {
        let settings = self.settings(ctx)?;
        let detector = ToolchainDetector::new(ctx.runner, ctx.env, ctx.platform)
            .with_layout(ctx.config.devkitpro.layout.clone());
        let resolver = DownloadResolver::new(ctx.metadata)
            .with_fallback_url(ctx.config.upgrade.fallback_url.clone())
            .with_base_url(ctx.config.upgrade.download_base.clone());

        let old_path = self
            .args
            .python
            .as_deref()
            .or(ctx.config.python.explicit_path.as_deref());

        let orchestrator =
            UpgradeOrchestrator::new(ctx.runner, &detector, &resolver, ctx.fetcher, settings);
        Ok(orchestrator.run(ui, old_path, None))
    }
}

fn show_report(ui: &mut dyn UserInterface, report: &UpgradeReport) {
    match report.status {
        SessionStatus::Completed if report.failures.is_empty() => {
            ui.success("Upgrade complete");
        }
        SessionStatus::Completed => {
            ui.success("Upgrade complete with warnings");
        }
        SessionStatus::PartialFailure => {
            ui.error("Upgrade finished, but some packages were not migrated");
        }
        _ => {
            let reason = report
                .abort_reason
                .as_ref()
                .map(|f| f.message.as_str())
                .unwrap_or("unknown reason");
            ui.error(&format!("Upgrade aborted: {}", reason));
        }
    }

    for failure in &report.failures {
        ui.message(&format!("  {} ({}): {}", failure.step, failure.kind, failure.message));
    }
    if report.migrated_packages > 0 {
        ui.message(&format!("Migrated packages: {}", report.migrated_packages));
    }
    if let Some(next) = &report.next_action {
        ui.show_hint(next);
    }
}

impl Command for UpgradeCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let report = self.run(ui, ctx)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| KamekError::Other(e.into()))?;
            println!("{}", json);
        } else {
            show_report(ui, &report);
        }

        Ok(CommandResult::from_bool(report.is_success()))
    }
}
