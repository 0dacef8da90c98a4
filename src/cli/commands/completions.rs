//! `kamek completions <shell>`.

use crate::cli::args::{Cli, CompletionsArgs};
use crate::ui::UserInterface;
use clap::CommandFactory;

use super::dispatcher::{Command, CommandContext, CommandResult};

pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }

    /// Write the script to stdout. Needs no configuration.
    pub fn generate(&self) -> CommandResult {
        self.write_to(&mut std::io::stdout());
        CommandResult::ok()
    }

    fn write_to(&self, out: &mut dyn std::io::Write) {
        let mut cmd = Cli::command();
        clap_complete::generate(self.args.shell, &mut cmd, "kamek", out);
    }
}

impl Command for CompletionsCommand {
    fn execute(
        &self,
        _ui: &mut dyn UserInterface,
        _ctx: &CommandContext<'_>,
    ) -> crate::error::Result<CommandResult> {
        Ok(self.generate())
    }
}
