//! Routing from parsed arguments to commands.
//!
//! [`CommandDispatcher::dispatch`] loads configuration, builds the real
//! [`CommandContext`] (process runner, environment, HTTP fetcher, release
//! metadata), and hands it to the selected [`Command`]. Tests skip straight to
//! [`CommandDispatcher::dispatch_with`] with fakes.

use std::path::PathBuf;

use crate::cli::args::{CheckArgs, Cli, Commands};
use crate::config::{load_config, AppPaths, KamekConfig};
use crate::download::{EndOfLifeClient, Fetcher, HttpFetcher, ReleaseMetadata};
use crate::error::Result;
use crate::shell::{is_elevated, EnvAccess, HostPlatform, ProcessRunner, SystemEnv, SystemRunner};
use crate::ui::UserInterface;

/// A kamek subcommand.
pub trait Command {
    /// Errors are for faults kamek could not report itself; a toolchain that
    /// is not ready is an `Ok` with a non-zero exit code.
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult>;
}

/// Outcome handed back to `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self::from_bool(true)
    }

    pub fn exit(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }

    /// Exit 0 when `ok`, else 1.
    pub fn from_bool(ok: bool) -> Self {
        Self::exit(if ok { 0 } else { 1 })
    }
}

/// Everything a command reads or runs, swappable for tests.
pub struct CommandContext<'a> {
    pub project_root: PathBuf,
    pub config: KamekConfig,
    pub paths: AppPaths,
    pub platform: HostPlatform,
    pub runner: &'a dyn ProcessRunner,
    pub env: &'a dyn EnvAccess,
    pub fetcher: &'a dyn Fetcher,
    pub metadata: &'a dyn ReleaseMetadata,
}

impl CommandContext<'_> {
    /// Installer download directory: config override or the cache dir.
    pub fn download_dir(&self) -> PathBuf {
        self.config
            .download_dir
            .clone()
            .unwrap_or_else(|| self.paths.downloads_dir())
    }
}

pub struct CommandDispatcher {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
}

impl CommandDispatcher {
    /// `config_override` is the `--config` path, if given.
    pub fn new(project_root: PathBuf, config_override: Option<PathBuf>) -> Self {
        Self {
            project_root,
            config_override,
        }
    }

    /// Load config, wire up the real system, and run the command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Some(Commands::Completions(args)) = &cli.command {
            return Ok(super::completions::CompletionsCommand::new(args.clone()).generate());
        }

        let config = load_config(&self.project_root, self.config_override.as_deref())?;
        let platform = HostPlatform::current();
        let runner = SystemRunner;
        let env = SystemEnv::new(platform, &runner, is_elevated());
        let fetcher = if ui.output_mode().shows_spinners() {
            HttpFetcher::new()
        } else {
            HttpFetcher::new().quiet()
        };
        let metadata = EndOfLifeClient::new(config.upgrade.metadata_url.clone());

        let ctx = CommandContext {
            project_root: self.project_root.clone(),
            config,
            paths: AppPaths::discover(),
            platform,
            runner: &runner,
            env: &env,
            fetcher: &fetcher,
            metadata: &metadata,
        };
        self.dispatch_with(cli, ui, &ctx)
    }

    /// Route to the command for `cli` using the given context.
    pub fn dispatch_with(
        &self,
        cli: &Cli,
        ui: &mut dyn UserInterface,
        ctx: &CommandContext<'_>,
    ) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Check(args)) => super::check::CheckCommand::new(args.clone()).execute(ui, ctx),
            Some(Commands::Upgrade(args)) => {
                super::upgrade::UpgradeCommand::new(args.clone()).execute(ui, ctx)
            }
            Some(Commands::Packages(args)) => {
                super::packages::PackagesCommand::new(args.clone()).execute(ui, ctx)
            }
            Some(Commands::Suite(args)) => super::suite::SuiteCommand::new(args.clone()).execute(ui, ctx),
            Some(Commands::ResolveUrl(args)) => {
                super::resolve::ResolveCommand::new(args.clone()).execute(ui, ctx)
            }
            Some(Commands::Info(args)) => super::info::InfoCommand::new(args.clone()).execute(ui, ctx),
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui, ctx)
            }
            None => super::check::CheckCommand::new(CheckArgs::default()).execute(ui, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::TestHost;
    use crate::shell::{ScriptedRunner, StaticEnv};
    use crate::ui::MockUI;
    use clap::Parser;

    #[test]
    fn exit_code_decides_success() {
        assert_eq!(CommandResult::ok(), CommandResult { success: true, exit_code: 0 });
        assert!(!CommandResult::exit(2).success);
        assert_eq!(CommandResult::from_bool(false).exit_code, 1);
    }

    #[test]
    fn no_subcommand_runs_check() {
        let temp = tempfile::tempdir().unwrap();
        let host = TestHost::new(ScriptedRunner::new(), StaticEnv::new().with("PATH", ""));
        let ctx = host.context(temp.path());
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf(), None);
        let mut ui = MockUI::new();

        let cli = Cli::parse_from(["kamek"]);
        let result = dispatcher.dispatch_with(&cli, &mut ui, &ctx).unwrap();

        assert!(!result.success);
        assert_eq!(ui.headers(), vec!["Toolchain check"]);
    }
}
