//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Kamek - toolchain setup and upgrades for NSMBW mod development.
#[derive(Debug, Parser)]
#[command(name = "kamek")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (skips user and project config discovery)
    #[arg(short, long, global = true, env = "KAMEK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never prompt; answer from defaults and KAMEK_PROMPT_* variables
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the interpreter, its packages, and devkitPro (default)
    Check(CheckArgs),

    /// Download a newer Python and migrate installed packages to it
    Upgrade(UpgradeArgs),

    /// Install the Python packages the build scripts need
    Packages(PackagesArgs),

    /// Inspect or install the devkitPro compiler suite
    Suite(SuiteArgs),

    /// Print the installer URL a version token resolves to
    ResolveUrl(ResolveArgs),

    /// Show environment information
    Info(InfoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Interpreter to check instead of searching PATH
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Minimum Python version (e.g. 3.8)
    #[arg(long, value_name = "VERSION")]
    pub min_version: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `upgrade` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UpgradeArgs {
    /// Interpreter being replaced
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// `latest`, an exact version (3.12.4), or an installer URL
    #[arg(long, value_name = "TOKEN")]
    pub to: Option<String>,

    /// Installer flavour: windows, windows-arm64, windows-x86, macos, source
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Where to save the installer
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `packages` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PackagesArgs {
    /// Interpreter to install into
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Only report what is missing
    #[arg(long)]
    pub check: bool,

    /// Packages to ensure instead of the configured list
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,
}

/// Arguments for the `suite` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SuiteArgs {
    /// Download the devkitPro updater and hand off to it
    #[arg(long)]
    pub install: bool,

    /// Updater URL (overrides config)
    #[arg(long, requires = "install")]
    pub url: Option<String>,

    /// Persist DEVKITPRO/DEVKITPPC for this suite root
    #[arg(long, value_name = "ROOT")]
    pub set_env: Option<PathBuf>,

    /// Write variables for all users (needs administrator rights)
    #[arg(long, requires = "set_env")]
    pub system: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve-url` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ResolveArgs {
    /// `latest`, an exact version, or a URL
    #[arg(default_value = "latest")]
    pub token: String,

    /// Installer flavour (defaults to this host)
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Do not contact the release-metadata service
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for ResolveArgs {
    fn default() -> Self {
        Self {
            token: "latest".to_string(),
            os: None,
            offline: false,
            json: false,
        }
    }
}

/// Arguments for the `info` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InfoArgs {
    /// Report whether the process has administrator rights
    #[arg(long)]
    pub check_admin: bool,

    /// Print the data directory, creating it if missing
    #[arg(long)]
    pub show_data_dir: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
