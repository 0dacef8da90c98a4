//! Scripted process runner for fabricated toolchain runs.
//!
//! Lets detection and the upgrade workflow run against canned command
//! output instead of real interpreters.

use std::cell::RefCell;

use super::process::{LaunchError, ProcessOutput, ProcessRunner, RunOptions};

#[derive(Debug, Clone)]
enum Scripted {
    Exit(ProcessOutput),
    Missing,
}

/// A [`ProcessRunner`] that answers from a table of argv prefixes.
///
/// The first rule whose prefix matches the invoked argv wins. Unmatched
/// invocations behave like a missing program. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(Vec<String>, Scripted)>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `prefix` with an exit code and stdout.
    pub fn respond(self, prefix: &[&str], exit_code: i32, stdout: &str) -> Self {
        self.respond_full(prefix, exit_code, stdout, "")
    }

    /// Answer `prefix` with an exit code, stdout, and stderr.
    pub fn respond_full(
        mut self,
        prefix: &[&str],
        exit_code: i32,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        self.rules.push((
            to_owned(prefix),
            Scripted::Exit(ProcessOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        ));
        self
    }

    /// Make `prefix` fail to launch.
    pub fn missing(mut self, prefix: &[&str]) -> Self {
        self.rules.push((to_owned(prefix), Scripted::Missing));
        self
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Whether any invocation started with `prefix`.
    pub fn was_called_with(&self, prefix: &[&str]) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|call| starts_with(call, prefix))
    }
}

fn to_owned(prefix: &[&str]) -> Vec<String> {
    prefix.iter().map(|s| s.to_string()).collect()
}

fn starts_with<S: AsRef<str>>(argv: &[String], prefix: &[S]) -> bool {
    argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, argv: &[String], _options: &RunOptions) -> Result<ProcessOutput, LaunchError> {
        self.calls.borrow_mut().push(argv.to_vec());

        let program = argv.first().cloned().unwrap_or_default();
        match self
            .rules
            .iter()
            .find(|(prefix, _)| starts_with(argv, prefix))
        {
            Some((_, Scripted::Exit(output))) => Ok(output.clone()),
            Some((_, Scripted::Missing)) | None => Err(LaunchError::NotFound { program }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::argv;

    #[test]
    fn first_matching_prefix_wins() {
        let runner = ScriptedRunner::new()
            .respond(&["python", "-m", "pip", "freeze"], 0, "PyYAML==6.0\n")
            .respond(&["python"], 0, "Python 3.12.4\n");

        let freeze = runner
            .run(&argv(["python", "-m", "pip", "freeze"]), &RunOptions::default())
            .unwrap();
        assert_eq!(freeze.stdout, "PyYAML==6.0\n");

        let version = runner
            .run(&argv(["python", "--version"]), &RunOptions::default())
            .unwrap();
        assert_eq!(version.stdout, "Python 3.12.4\n");
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn unmatched_is_missing_program() {
        let runner = ScriptedRunner::new();
        let err = runner
            .run(&argv(["gcc", "--version"]), &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, LaunchError::NotFound { program } if program == "gcc"));
        assert!(runner.was_called_with(&["gcc"]));
    }
}
