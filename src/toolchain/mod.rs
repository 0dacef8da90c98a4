//! Toolchain detection and acquisition.
//!
//! - [`version`]: run an executable and read its version
//! - [`paths`]: map recorded locations onto this machine's filesystem
//! - [`detector`]: interpreter and compiler-suite verdicts
//! - [`packages`]: required interpreter packages
//! - [`suite_install`]: compiler-suite updater hand-off

pub mod detector;
pub mod packages;
pub mod paths;
pub mod status;
pub mod suite_install;
pub mod version;

pub use detector::{
    CompilerSuiteReport, InterpreterReport, SuiteLayout, ToolchainDetector, GENERIC_COMMAND,
    INTERPRETER_NAME,
};
pub use packages::{package_name, PackageInstaller, PackageOutcome, PackageState, DEFAULT_REQUIRED_PACKAGES};
pub use paths::{same_path, PathResolver, RewriteRule, ToolchainLocation};
pub use status::{Advisory, DetectError};
pub use suite_install::{SuiteInstallAction, SuiteInstallOutcome, SuiteInstaller, DEFAULT_UPDATER_URL};
pub use version::{parse_version_output, RuntimeDescriptor, VersionProbe, VersionTuple};
