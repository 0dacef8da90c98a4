//! Configuration schema definitions for Kamek.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::download::{DEFAULT_DOWNLOAD_BASE, DEFAULT_FALLBACK_URL, DEFAULT_METADATA_URL};
use crate::toolchain::{SuiteLayout, VersionTuple, DEFAULT_REQUIRED_PACKAGES, DEFAULT_UPDATER_URL};

/// Root configuration structure for `config.yml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KamekConfig {
    pub python: PythonConfig,

    pub devkitpro: DevkitProConfig,

    pub upgrade: UpgradeConfig,

    /// Where installers are downloaded; defaults to the user cache dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

/// Interpreter requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Minimum accepted version, `X.Y` or `X.Y.Z`
    pub min_version: String,

    /// Packages the build scripts import
    pub required_packages: Vec<String>,

    /// Interpreter to use instead of searching PATH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_path: Option<PathBuf>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            min_version: "3.8".to_string(),
            required_packages: DEFAULT_REQUIRED_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            explicit_path: None,
        }
    }
}

impl PythonConfig {
    /// Parse `min_version`, accepting a missing patch component.
    pub fn min_version(&self) -> Option<VersionTuple> {
        parse_min_version(&self.min_version)
    }
}

/// Compiler suite layout and acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevkitProConfig {
    #[serde(flatten)]
    pub layout: SuiteLayout,

    /// Updater downloaded by `kamek suite --install`
    pub updater_url: String,
}

impl Default for DevkitProConfig {
    fn default() -> Self {
        Self {
            layout: SuiteLayout::default(),
            updater_url: DEFAULT_UPDATER_URL.to_string(),
        }
    }
}

/// Upgrade workflow settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// How many new-path answers are accepted before giving up
    pub max_path_attempts: u32,

    /// `latest`, `X.Y.Z`, or an installer URL
    pub version_token: String,

    /// Installer flavour; defaults to one matching this host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_filter: Option<String>,

    pub fallback_url: String,

    pub metadata_url: String,

    pub download_base: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            max_path_attempts: 5,
            version_token: "latest".to_string(),
            os_filter: None,
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
        }
    }
}

/// `3.8` means `3.8.0`.
pub fn parse_min_version(raw: &str) -> Option<VersionTuple> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('.').collect();
    match parts.len() {
        2 => VersionTuple::parse_strict(&format!("{}.0", raw)),
        3 => VersionTuple::parse_strict(raw),
        _ => None,
    }
}
