//! Info command implementation.
//!
//! The `kamek info` command reports privilege level and where Kamek keeps
//! its files.

use crate::cli::args::InfoArgs;
use crate::error::Result;
use crate::shell::{is_ci, is_elevated};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The info command implementation.
pub struct InfoCommand {
    args: InfoArgs,
}

impl InfoCommand {
    pub fn new(args: InfoArgs) -> Self {
        Self { args }
    }
}

impl Command for InfoCommand {
    fn execute(&self, ui: &mut dyn UserInterface, ctx: &CommandContext<'_>) -> Result<CommandResult> {
        let everything = !self.args.check_admin && !self.args.show_data_dir;

        if self.args.check_admin {
            // Machine-readable for scripts.
            println!("{}", is_elevated());
        }

        if self.args.show_data_dir {
            ctx.paths.ensure_dirs()?;
            println!("{}", ctx.paths.data_dir.display());
        }

        if everything {
            ui.show_header(&format!("kamek {}", env!("CARGO_PKG_VERSION")));
            ui.message(&format!("Platform:       {}", ctx.platform));
            ui.message(&format!("Administrator:  {}", is_elevated()));
            ui.message(&format!("CI:             {}", is_ci()));
            ui.message(&format!("Config dir:     {}", ctx.paths.config_dir.display()));
            ui.message(&format!("Data dir:       {}", ctx.paths.data_dir.display()));
            ui.message(&format!("Downloads:      {}", ctx.download_dir().display()));
            ui.message(&format!("Tools:          {}", ctx.paths.tools_dir().display()));
        }

        Ok(CommandResult::ok())
    }
}
