//! Process execution, platform identity, and environment access.

pub mod env;
pub mod platform;
pub mod process;
pub mod scripted;

pub use env::{EnvAccess, EnvScope, EnvWrite, StaticEnv, SystemEnv};
pub use platform::{is_ci, is_elevated, HostPlatform};
pub use process::{argv, LaunchError, ProcessOutput, ProcessRunner, RunOptions, SystemRunner};
pub use scripted::ScriptedRunner;
