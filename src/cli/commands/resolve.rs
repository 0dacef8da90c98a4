//! Resolve-url command implementation.
//!
//! The `kamek resolve-url` command prints the installer URL a version
//! token resolves to, without downloading anything.

use crate::cli::args::ResolveArgs;
use crate::download::{DownloadResolver, DownloadTarget, OsFilter, ReleaseMetadata, StaticMetadata};
use crate::error::{KamekError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The resolve-url command implementation.
pub struct ResolveCommand {
    args: ResolveArgs,
}

impl ResolveCommand {
    pub fn new(args: ResolveArgs) -> Self {
        Self { args }
    }

    pub fn resolve(&self, ctx: &CommandContext<'_>) -> DownloadTarget {
        let offline = StaticMetadata::unreachable();
        let metadata: &dyn ReleaseMetadata = if self.args.offline {
            &offline
        } else {
            ctx.metadata
        };
        let os_filter = self
            .args
            .os
            .clone()
            .or_else(|| ctx.config.upgrade.os_filter.clone())
            .unwrap_or_else(|| OsFilter::for_host().to_string());

        DownloadResolver::new(metadata)
            .with_fallback_url(ctx.config.upgrade.fallback_url.clone())
            .with_base_url(ctx.config.upgrade.download_base.clone())
            .resolve(&self.args.token, &os_filter)
    }
}

impl Command for ResolveCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let target = self.resolve(ctx);

        if self.args.json {
            let json = serde_json::to_string_pretty(&target)
                .map_err(|e| KamekError::Other(e.into()))?;
            println!("{}", json);
        } else {
            for advisory in &target.advisories {
                ui.advisory(advisory);
            }
            // The URL itself is the output, so print it whatever the mode.
            println!("{}", target.resolved_url);
            if target.is_fallback {
                ui.show_hint("This is the fallback installer; pass an exact version like 3.12.4 or a URL");
            }
        }

        Ok(CommandResult::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::TestHost;
    use crate::download::{ReleaseCycle, DEFAULT_FALLBACK_URL};
    use crate::shell::{ScriptedRunner, StaticEnv};
    use crate::toolchain::VersionTuple;
    use tempfile::TempDir;

    fn args(token: &str) -> ResolveArgs {
        ResolveArgs {
            token: token.to_string(),
            os: Some("windows".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn latest_uses_context_metadata() {
        let temp = TempDir::new().unwrap();
        let mut host = TestHost::new(ScriptedRunner::new(), StaticEnv::new());
        host.metadata = StaticMetadata::new(vec![
            ReleaseCycle::new(VersionTuple::new(3, 11, 0), true),
            ReleaseCycle::new(VersionTuple::new(3, 12, 4), false),
        ]);
        let ctx = host.context(temp.path());

        let target = ResolveCommand::new(args("latest")).resolve(&ctx);
        assert!(target.resolved_url.ends_with("python-3.12.4-amd64.exe"));
        assert!(!target.is_fallback);
    }

    #[test]
    fn offline_latest_falls_back() {
        let temp = TempDir::new().unwrap();
        let mut host = TestHost::new(ScriptedRunner::new(), StaticEnv::new());
        host.metadata = StaticMetadata::new(vec![ReleaseCycle::new(VersionTuple::new(3, 12, 4), false)]);
        let ctx = host.context(temp.path());
        let mut resolve_args = args("latest");
        resolve_args.offline = true;

        let target = ResolveCommand::new(resolve_args).resolve(&ctx);
        assert!(target.is_fallback);
        assert_eq!(target.resolved_url, DEFAULT_FALLBACK_URL);
    }

    #[test]
    fn garbage_token_falls_back() {
        let temp = TempDir::new().unwrap();
        let host = TestHost::new(ScriptedRunner::new(), StaticEnv::new());
        let ctx = host.context(temp.path());

        let target = ResolveCommand::new(args("abc")).resolve(&ctx);
        assert!(target.is_fallback);
    }
}
