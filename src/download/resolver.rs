//! Turns a version token into a concrete installer URL.
//!
//! Resolution never fails outright. When the version cannot be determined
//! or the platform has no filename template, the result is the configured
//! fallback URL, flagged as such, with an advisory saying which of the two
//! went wrong.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::toolchain::{Advisory, VersionTuple};

use super::metadata::ReleaseMetadata;

/// Installer used when nothing better can be resolved.
pub const DEFAULT_FALLBACK_URL: &str =
    "https://www.python.org/ftp/python/3.9.13/python-3.9.13-amd64.exe";

/// Base of python.org's release tree.
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://www.python.org/ftp/python";

/// Which installer flavour to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OsFilter {
    Windows,
    WindowsArm64,
    WindowsX86,
    Macos,
    Source,
}

impl OsFilter {
    pub const ALL: &'static [OsFilter] = &[
        OsFilter::Windows,
        OsFilter::WindowsArm64,
        OsFilter::WindowsX86,
        OsFilter::Macos,
        OsFilter::Source,
    ];

    /// Best guess for the machine this binary runs on.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            if cfg!(target_arch = "aarch64") {
                OsFilter::WindowsArm64
            } else if cfg!(target_arch = "x86") {
                OsFilter::WindowsX86
            } else {
                OsFilter::Windows
            }
        } else if cfg!(target_os = "macos") {
            OsFilter::Macos
        } else {
            OsFilter::Source
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFilter::Windows => "windows",
            OsFilter::WindowsArm64 => "windows-arm64",
            OsFilter::WindowsX86 => "windows-x86",
            OsFilter::Macos => "macos",
            OsFilter::Source => "source",
        }
    }

    /// Installer file name for `version`.
    pub fn filename(&self, version: &VersionTuple) -> String {
        match self {
            OsFilter::Windows => format!("python-{}-amd64.exe", version),
            OsFilter::WindowsArm64 => format!("python-{}-arm64.exe", version),
            OsFilter::WindowsX86 => format!("python-{}.exe", version),
            OsFilter::Macos => format!("python-{}-macos11.pkg", version),
            OsFilter::Source => format!("Python-{}.tgz", version),
        }
    }
}

impl fmt::Display for OsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OsFilter::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unsupported OS filter: {}", s))
    }
}

/// A resolved (or fallback) installer URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTarget {
    /// The token as given.
    pub version_token: String,
    pub resolved_url: String,
    pub is_fallback: bool,
    /// Version the URL points at, when known.
    pub version: Option<VersionTuple>,
    pub advisories: Vec<Advisory>,
}

impl DownloadTarget {
    /// File name component of the URL.
    pub fn file_name(&self) -> &str {
        self.resolved_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("installer")
    }
}

fn is_url(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Resolves version tokens against a release-metadata source.
pub struct DownloadResolver<'a> {
    metadata: &'a dyn ReleaseMetadata,
    fallback_url: String,
    base_url: String,
}

impl<'a> DownloadResolver<'a> {
    pub fn new(metadata: &'a dyn ReleaseMetadata) -> Self {
        Self {
            metadata,
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            base_url: DEFAULT_DOWNLOAD_BASE.to_string(),
        }
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = url.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve `token` (`latest`, `X.Y.Z`, or a URL) for `os_filter`.
    pub fn resolve(&self, token: &str, os_filter: &str) -> DownloadTarget {
        let token = token.trim();

        if is_url(token) {
            return DownloadTarget {
                version_token: token.to_string(),
                resolved_url: token.to_string(),
                is_fallback: false,
                version: None,
                advisories: Vec::new(),
            };
        }

        let mut advisories = Vec::new();
        let version = if token.eq_ignore_ascii_case("latest") {
            self.latest(&mut advisories)
        } else {
            let parsed = VersionTuple::parse_strict(token);
            if parsed.is_none() {
                advisories.push(Advisory::new(
                    "invalid_version",
                    format!("'{}' is not a version of the form X.Y.Z", token),
                ));
            }
            parsed
        };

        let Some(version) = version else {
            return self.fallback(token, advisories);
        };

        let filter = match os_filter.parse::<OsFilter>() {
            Ok(filter) => filter,
            Err(reason) => {
                advisories.push(Advisory::new("unsupported_os_filter", reason));
                return self.fallback(token, advisories);
            }
        };

        let url = format!("{}/{}/{}", self.base_url, version, filter.filename(&version));
        tracing::debug!("Resolved '{}' ({}) to {}", token, filter, url);
        DownloadTarget {
            version_token: token.to_string(),
            resolved_url: url,
            is_fallback: false,
            version: Some(version),
            advisories,
        }
    }

    /// Newest cycle not yet end-of-life, or the newest of all with an advisory.
    fn latest(&self, advisories: &mut Vec<Advisory>) -> Option<VersionTuple> {
        let mut cycles = match self.metadata.release_cycles() {
            Ok(cycles) => cycles,
            Err(e) => {
                tracing::warn!("Release metadata unavailable: {:#}", e);
                advisories.push(Advisory::new(
                    "metadata_unavailable",
                    format!("Could not determine the latest release: {}", e),
                ));
                return None;
            }
        };
        cycles.sort_by(|a, b| b.version.cmp(&a.version));

        if let Some(supported) = cycles.iter().find(|c| !c.end_of_life) {
            return Some(supported.version);
        }

        let newest = cycles.first()?;
        advisories.push(Advisory::new(
            "all_cycles_end_of_life",
            format!(
                "Every listed release cycle is end-of-life; using the newest, {}",
                newest.version
            ),
        ));
        Some(newest.version)
    }

    fn fallback(&self, token: &str, advisories: Vec<Advisory>) -> DownloadTarget {
        tracing::debug!("Using fallback installer URL for '{}'", token);
        DownloadTarget {
            version_token: token.to_string(),
            resolved_url: self.fallback_url.clone(),
            is_fallback: true,
            version: None,
            advisories,
        }
    }
}
