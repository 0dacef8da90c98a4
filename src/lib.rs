//! Kamek - toolchain provisioning and upgrades for NSMBW mod development.
//!
//! Kamek checks that a usable Python interpreter, its required packages,
//! and the devkitPro compiler suite are present; resolves toolchain paths
//! recorded under another OS's conventions; and walks the user through
//! replacing their Python with a newer one while carrying installed packages
//! across.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and application directories
//! - [`download`] - Installer URL resolution, release metadata, downloads
//! - [`error`] - Error types and result aliases
//! - [`shell`] - Process execution, platform identity, environment access
//! - [`toolchain`] - Version probing, path resolution, detection
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`upgrade`] - The interpreter upgrade workflow
//!
//! # Example
//!
//! ```
//! use kamek::download::{DownloadResolver, ReleaseCycle, StaticMetadata};
//! use kamek::toolchain::VersionTuple;
//!
//! let metadata = StaticMetadata::new(vec![
//!     ReleaseCycle::new(VersionTuple::new(3, 11, 0), true),
//!     ReleaseCycle::new(VersionTuple::new(3, 12, 4), false),
//! ]);
//! let target = DownloadResolver::new(&metadata).resolve("latest", "windows");
//! assert!(target.resolved_url.ends_with("python-3.12.4-amd64.exe"));
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod shell;
pub mod toolchain;
pub mod ui;
pub mod upgrade;

pub use error::{KamekError, Result};
