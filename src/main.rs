//! Kamek CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use kamek::cli::{Cli, CommandDispatcher};
use kamek::shell::is_ci;
use kamek::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Diagnostics go to stderr. `--debug` forces `kamek=debug`; otherwise
/// `RUST_LOG` applies, falling back to `kamek=info`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("kamek=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kamek=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Parsed arguments: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let root = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_default(),
    };
    let mut ui = create_ui(!cli.non_interactive && !is_ci(), output_mode);

    let outcome = CommandDispatcher::new(root, cli.config.clone()).dispatch(&cli, ui.as_mut());
    match outcome {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            tracing::debug!("Command failed ({:?}): {:#}", e.kind(), e);
            ui.error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
