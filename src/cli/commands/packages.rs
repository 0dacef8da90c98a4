//! Packages command implementation.
//!
//! The `kamek packages` command installs the Python packages the build
//! scripts import, skipping any that are already present.

use crate::cli::args::PackagesArgs;
use crate::error::{KamekError, Result};
use crate::toolchain::{PackageInstaller, PackageOutcome, PackageState, ToolchainDetector};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The packages command implementation.
pub struct PackagesCommand {
    args: PackagesArgs,
}

impl PackagesCommand {
    pub fn new(args: PackagesArgs) -> Self {
        Self { args }
    }

    fn requested(&self, ctx: &CommandContext<'_>) -> Vec<String> {
        if self.args.packages.is_empty() {
            ctx.config.python.required_packages.clone()
        } else {
            self.args.packages.clone()
        }
    }
}

fn show_outcome(ui: &mut dyn UserInterface, outcome: &PackageOutcome) {
    match &outcome.state {
        PackageState::AlreadyInstalled => ui.success(&format!("{} already installed", outcome.name)),
        PackageState::Installed => ui.success(&format!("Installed {}", outcome.spec)),
        PackageState::Missing => ui.warning(&format!("{} is not installed", outcome.name)),
        PackageState::Failed { message } => ui.error(&format!("{}: {}", outcome.spec, message)),
    }
}

impl Command for PackagesCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let min_version = ctx.config.python.min_version().ok_or_else(|| {
            KamekError::ConfigParseError {
                path: ctx.project_root.clone(),
                message: format!("invalid python.min_version '{}'", ctx.config.python.min_version),
            }
        })?;

        let detector = ToolchainDetector::new(ctx.runner, ctx.env, ctx.platform);
        let explicit = self
            .args
            .python
            .as_deref()
            .or(ctx.config.python.explicit_path.as_deref());
        let interpreter = match detector.detect_interpreter(min_version, explicit, None) {
            Ok(report) => report.runtime,
            Err(e) => {
                ui.error(&KamekError::from(e).to_string());
                ui.show_hint("Pass the interpreter with --python <path>");
                return Ok(CommandResult::exit(1));
            }
        };

        ui.show_header(&format!(
            "Packages for Python {} ({})",
            interpreter.version,
            interpreter.executable_path.display()
        ));

        let installer = PackageInstaller::new(ctx.runner, &interpreter.executable_path);
        let requested = self.requested(ctx);
        let outcomes = if self.args.check {
            installer.check(&requested)
        } else {
            installer.ensure(&requested)
        };

        for outcome in &outcomes {
            show_outcome(ui, outcome);
        }

        let ok = outcomes
            .iter()
            .all(|o| matches!(o.state, PackageState::AlreadyInstalled | PackageState::Installed));
        if !ok && self.args.check {
            ui.show_hint("Run `kamek packages` to install them");
        }
        Ok(CommandResult::from_bool(ok))
    }
}
