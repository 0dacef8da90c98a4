//! Check command implementation.
//!
//! The `kamek check` command reports whether the interpreter, its required
//! packages, and the devkitPro suite are ready. It changes nothing.

use serde::Serialize;

use crate::cli::args::CheckArgs;
use crate::config::parse_min_version;
use crate::error::{ErrorKind, KamekError, Result};
use crate::toolchain::{
    Advisory, CompilerSuiteReport, InterpreterReport, PackageInstaller, PackageOutcome,
    PackageState, ToolchainDetector,
};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// A detection failure in report form.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<KamekError> for Problem {
    fn from(err: KamekError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Everything `check` found.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub interpreter: Option<InterpreterReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter_problem: Option<Problem>,
    pub packages: Vec<PackageOutcome>,
    pub compiler_suite: Option<CompilerSuiteReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_suite_problem: Option<Problem>,
}

impl CheckReport {
    /// Interpreter usable, no package missing, suite present.
    pub fn is_ready(&self) -> bool {
        self.interpreter.is_some()
            && self.compiler_suite.is_some()
            && self
                .packages
                .iter()
                .all(|p| p.state == PackageState::AlreadyInstalled)
    }
}

/// The check command implementation.
pub struct CheckCommand {
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(args: CheckArgs) -> Self {
        Self { args }
    }

    /// Run every check without printing.
    pub fn inspect(&self, ctx: &CommandContext<'_>) -> Result<CheckReport> {
        let raw_min = self
            .args
            .min_version
            .as_deref()
            .unwrap_or(&ctx.config.python.min_version);
        let min_version = parse_min_version(raw_min).ok_or_else(|| KamekError::ConfigParseError {
            path: ctx.project_root.clone(),
            message: format!("invalid minimum Python version '{}'", raw_min),
        })?;

        let detector = ToolchainDetector::new(ctx.runner, ctx.env, ctx.platform)
            .with_layout(ctx.config.devkitpro.layout.clone());
        let explicit = self
            .args
            .python
            .as_deref()
            .or(ctx.config.python.explicit_path.as_deref());

        let (interpreter, interpreter_problem) =
            match detector.detect_interpreter(min_version, explicit, None) {
                Ok(report) => (Some(report), None),
                Err(e) => (None, Some(Problem::from(KamekError::from(e)))),
            };

        let packages = match &interpreter {
            Some(report) => PackageInstaller::new(ctx.runner, &report.runtime.executable_path)
                .check(&ctx.config.python.required_packages),
            None => Vec::new(),
        };

        let (compiler_suite, compiler_suite_problem) = match detector.detect_compiler_suite() {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(Problem::from(KamekError::from(e)))),
        };

        Ok(CheckReport {
            interpreter,
            interpreter_problem,
            packages,
            compiler_suite,
            compiler_suite_problem,
        })
    }
}

fn show_advisories(ui: &mut dyn UserInterface, advisories: &[Advisory]) {
    for advisory in advisories {
        ui.advisory(advisory);
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let report = self.inspect(ctx)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| KamekError::Other(e.into()))?;
            println!("{}", json);
            return Ok(CommandResult::from_bool(report.is_ready()));
        }

        ui.show_header("Toolchain check");

        match (&report.interpreter, &report.interpreter_problem) {
            (Some(found), _) => {
                ui.success(&format!(
                    "Python {} ({})",
                    found.runtime.version,
                    found.runtime.executable_path.display()
                ));
                show_advisories(ui, &found.advisories);
            }
            (None, Some(problem)) => {
                ui.error(&format!("Python: {}", problem.message));
                ui.show_hint("Install Python 3 or pass --python <path>; `kamek upgrade` can fetch a newer one");
            }
            (None, None) => {}
        }

        let missing: Vec<&str> = report
            .packages
            .iter()
            .filter(|p| p.state != PackageState::AlreadyInstalled)
            .map(|p| p.name.as_str())
            .collect();
        if report.interpreter.is_some() {
            if missing.is_empty() {
                ui.success("Required packages installed");
            } else {
                ui.error(&format!("Missing packages: {}", missing.join(", ")));
                ui.show_hint("Run `kamek packages` to install them");
            }
        }

        match (&report.compiler_suite, &report.compiler_suite_problem) {
            (Some(suite), _) => {
                ui.success(&format!(
                    "devkitPro at {}",
                    suite.location.resolved_path.display()
                ));
                show_advisories(ui, &suite.advisories);
            }
            (None, Some(problem)) => {
                ui.error(&format!("devkitPro: {}", problem.message));
                ui.show_hint("Run `kamek suite --install` to fetch the devkitPro updater");
            }
            (None, None) => {}
        }

        Ok(CommandResult::from_bool(report.is_ready()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::TestHost;
    use crate::shell::{ScriptedRunner, StaticEnv};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    #[test]
    fn reports_missing_everything() {
        let temp = TempDir::new().unwrap();
        let host = TestHost::new(ScriptedRunner::new(), StaticEnv::new().with("PATH", ""));
        let ctx = host.context(temp.path());
        let mut ui = MockUI::new();

        let result = CheckCommand::new(CheckArgs::default())
            .execute(&mut ui, &ctx)
            .unwrap();

        assert!(!result.success);
        assert!(ui.has_error("Python"));
        assert!(ui.has_error("devkitPro"));
        assert!(ui.has_hint("kamek suite --install"));
    }

    #[test]
    fn invalid_min_version_is_config_error() {
        let temp = TempDir::new().unwrap();
        let host = TestHost::new(ScriptedRunner::new(), StaticEnv::new());
        let ctx = host.context(temp.path());
        let args = CheckArgs {
            min_version: Some("three".into()),
            ..Default::default()
        };

        let err = CheckCommand::new(args).inspect(&ctx).unwrap_err();
        assert!(matches!(err, KamekError::ConfigParseError { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn ready_toolchain_passes() {
        let temp = TempDir::new().unwrap();
        let python = temp.path().join("python3");
        std::fs::write(&python, "").unwrap();
        let suite = temp.path().join("devkitPro");
        std::fs::create_dir_all(suite.join("devkitPPC")).unwrap();
        std::fs::create_dir_all(suite.join("tools/bin")).unwrap();
        std::fs::write(suite.join("tools/bin/elf2dol"), "").unwrap();

        let py = python.to_str().unwrap();
        let runner = ScriptedRunner::new()
            .respond(&[py, "--version"], 0, "Python 3.11.4")
            .respond(&[py, "-m", "pip", "show"], 0, "Name: x");
        let env = StaticEnv::new()
            .with("PATH", "")
            .with("DEVKITPRO", suite.to_str().unwrap());
        let host = TestHost::new(runner, env);
        let ctx = host.context(temp.path());
        let args = CheckArgs {
            python: Some(python.clone()),
            ..Default::default()
        };

        let report = CheckCommand::new(args).inspect(&ctx).unwrap();
        assert!(report.is_ready(), "{:?}", report);
        assert_eq!(report.packages.len(), 2);
    }
}
