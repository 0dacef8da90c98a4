//! Configuration loading for Kamek.
//!
//! - Schema definitions in [`schema`]
//! - File discovery, layering, and parsing in [`loader`]
//! - Per-user directories in [`paths`]
//!
//! # Example
//!
//! ```
//! use kamek::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("config.yml");
//! fs::write(&path, "python:\n  min_version: '3.10'\n").unwrap();
//!
//! let config = load_config(temp.path(), Some(&path)).unwrap();
//! assert_eq!(config.python.min_version, "3.10");
//! ```
//!
//! # Configuration File Locations
//!
//! Without `--config`, Kamek merges in this order:
//! 1. User config (`<config dir>/kamek/config.yml`)
//! 2. Project config (`.kamek/config.yml`)

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::{
    load_config, load_config_value, overlay, project_config_path, ConfigPaths, CONFIG_FILE_NAME,
};
pub use paths::AppPaths;
pub use schema::{
    parse_min_version, DevkitProConfig, KamekConfig, PythonConfig, UpgradeConfig,
};
