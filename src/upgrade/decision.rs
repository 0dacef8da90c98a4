//! Validation of a user-supplied path to the newly installed interpreter.
//!
//! The answer to "where is the new interpreter?" is untrusted: the user may
//! paste the old path, a typo, or a foreign-convention path. This module
//! turns one answer into a decision without doing any prompting itself.

use std::path::Path;

use crate::shell::HostPlatform;
use crate::toolchain::{same_path, DetectError, PathResolver, RuntimeDescriptor};

/// Input that skips migration.
pub const SKIP_KEYWORD: &str = "skip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDecision {
    /// The candidate was verified as a distinct, acceptable interpreter.
    Accept(RuntimeDescriptor),
    /// Ask again; the string says why.
    Retry(String),
    /// The user chose to proceed without migration.
    Skip,
}

/// Decide what to do with one answer.
///
/// `verify` re-probes the resolved candidate and applies the version rules.
pub fn validate_new_path<F>(
    input: &str,
    old: &RuntimeDescriptor,
    resolver: &PathResolver,
    platform: HostPlatform,
    verify: F,
) -> PathDecision
where
    F: FnOnce(&Path) -> Result<RuntimeDescriptor, DetectError>,
{
    let answer = input.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    if answer.eq_ignore_ascii_case(SKIP_KEYWORD) {
        return PathDecision::Skip;
    }
    if answer.is_empty() {
        return PathDecision::Retry("Please enter a path, or 'skip'".to_string());
    }

    let location = match resolver.resolve(answer) {
        Ok(location) => location,
        Err(e) => return PathDecision::Retry(e.to_string()),
    };

    if same_path(&location.resolved_path, &old.executable_path, platform) {
        return PathDecision::Retry(format!(
            "{} is the interpreter being replaced; enter the path of the new one",
            location.resolved_path.display()
        ));
    }

    match verify(&location.resolved_path) {
        Ok(runtime) => PathDecision::Accept(runtime),
        Err(e) => PathDecision::Retry(format!(
            "{} was not accepted: {}",
            location.resolved_path.display(),
            e
        )),
    }
}
