//! Environment variable access.
//!
//! Reads go through [`EnvAccess::get`] so detection can run against a
//! fabricated environment. Persistent writes are platform strategies: on
//! Windows they shell out to `setx`, elsewhere they hand the user the exact
//! line to add to their shell profile.

use std::collections::HashMap;

use crate::error::{KamekError, Result};

use super::platform::HostPlatform;
use super::process::{argv, ProcessRunner, RunOptions};

/// Who a persistent variable applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvScope {
    /// The current user only.
    User,
    /// All users; needs elevation on Windows.
    System,
}

/// Outcome of a persistent environment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvWrite {
    /// The variable was written; new shells will see it.
    Applied,
    /// This platform cannot write it for the user; they must do it themselves.
    ManualStepRequired { instruction: String },
}

/// Read and persist environment variables.
pub trait EnvAccess {
    /// Value of `name` in the current process environment.
    fn get(&self, name: &str) -> Option<String>;

    /// Persist `name=value` for future shells.
    ///
    /// Returns [`KamekError::PrivilegeRequired`] when the scope needs
    /// elevation the process does not hold.
    fn set_persistent(&self, name: &str, value: &str, scope: EnvScope) -> Result<EnvWrite>;
}

/// The real process environment with a platform write strategy.
pub struct SystemEnv<'a> {
    platform: HostPlatform,
    runner: &'a dyn ProcessRunner,
    elevated: bool,
}

impl<'a> SystemEnv<'a> {
    pub fn new(platform: HostPlatform, runner: &'a dyn ProcessRunner, elevated: bool) -> Self {
        Self {
            platform,
            runner,
            elevated,
        }
    }
}

impl EnvAccess for SystemEnv<'_> {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn set_persistent(&self, name: &str, value: &str, scope: EnvScope) -> Result<EnvWrite> {
        match self.platform {
            HostPlatform::Windows => {
                if scope == EnvScope::System && !self.elevated {
                    return Err(KamekError::PrivilegeRequired {
                        action: format!(
                            "set {} system-wide; re-run as administrator or use user scope",
                            name
                        ),
                    });
                }
                let mut cmd = argv(["setx", name, value]);
                if scope == EnvScope::System {
                    cmd.push("/M".to_string());
                }
                tracing::debug!("Setting environment variable {} via setx", name);
                // setx may exit nonzero when the value is unchanged, so only a
                // launch failure counts as an error.
                self.runner
                    .run(&cmd, &RunOptions::default())
                    .map_err(|e| KamekError::external("setx", e.to_string()))?;
                Ok(EnvWrite::Applied)
            }
            HostPlatform::Unix => Ok(EnvWrite::ManualStepRequired {
                instruction: format!(
                    "Add `export {}=\"{}\"` to your shell profile (e.g. ~/.bashrc or ~/.zshrc)",
                    name, value
                ),
            }),
        }
    }
}

/// Fixed in-memory environment for fabricated detection runs.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variable assignment.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl EnvAccess for StaticEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set_persistent(&self, _name: &str, _value: &str, _scope: EnvScope) -> Result<EnvWrite> {
        Ok(EnvWrite::Applied)
    }
}
