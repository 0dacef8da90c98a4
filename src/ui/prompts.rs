//! Terminal prompts via dialoguer.

use std::io;

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use crate::error::{KamekError, Result};

use super::{parse_yes_no, Prompt, PromptResult, PromptType};

/// Ask `prompt` on `term`.
///
/// Ctrl-C or a closed terminal counts as the user aborting, not as an I/O
/// fault, so the upgrade workflow can end the session with a next action.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let theme = ColorfulTheme {
        prompt_prefix: style(String::new()),
        ..ColorfulTheme::default()
    };

    let answer = match prompt.prompt_type {
        PromptType::Confirm => {
            // dialoguer keeps asking until it reads y or n.
            let mut confirm = Confirm::with_theme(&theme).with_prompt(&prompt.question);
            if let Some(default) = prompt.default.as_deref().and_then(parse_yes_no) {
                confirm = confirm.default(default);
            }
            confirm.interact_on(term).map(PromptResult::Bool)
        }
        PromptType::Input => {
            let mut input = Input::<String>::with_theme(&theme)
                .with_prompt(&prompt.question)
                .allow_empty(true);
            if let Some(default) = &prompt.default {
                input = input.default(default.clone());
            }
            input.interact_on(term).map(PromptResult::String)
        }
    };

    answer.map_err(|e| prompt_error(prompt, e))
}

fn prompt_error(prompt: &Prompt, err: dialoguer::Error) -> KamekError {
    let io_err: io::Error = err.into();
    match io_err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof => KamekError::UserAborted {
            reason: format!("'{}' was not answered", prompt.key),
        },
        _ => KamekError::Io(io_err),
    }
}
