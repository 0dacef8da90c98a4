//! Version probing for toolchain executables.
//!
//! A [`VersionProbe`] runs a candidate executable with a version flag and
//! matches `Name <major>.<minor>.<patch>` in the merged output. Anything
//! that goes wrong (launch failure, timeout, no match) is reported as
//! [`DetectError::NotFound`]; probing never panics or propagates IO errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::shell::{ProcessRunner, RunOptions};

use super::status::DetectError;

/// Default timeout for a single version probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Path fragments that identify sandboxed interpreter distributions.
pub const DEFAULT_RESTRICTED_MARKERS: &[&str] =
    &["WindowsApps", "PythonSoftwareFoundation.Python", "/snap/"];

/// A `major.minor.patch` triple, ordered lexicographically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct VersionTuple {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTuple {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse exactly `int.int.int`, nothing more or less.
    pub fn parse_strict(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Accepts `major`, `major.minor`, or `major.minor.patch`; missing parts are 0.
impl FromStr for VersionTuple {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(format!("invalid version: {}", s));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = parse_component(part).ok_or_else(|| format!("invalid version: {}", s))?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Resolved identity of a toolchain executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    /// The executable that was probed.
    pub executable_path: PathBuf,
    /// Version reported by the executable.
    pub version: VersionTuple,
    /// Whether the path looks like a sandboxed store/snap package.
    pub restricted: bool,
}

/// Runs executables and extracts their version.
pub struct VersionProbe<'a> {
    runner: &'a dyn ProcessRunner,
    pattern: Regex,
    flag: String,
    timeout: Duration,
    restricted_markers: Vec<String>,
}

impl<'a> VersionProbe<'a> {
    /// Create a probe matching `<name> X.Y.Z` (case-insensitive) in `--version` output.
    pub fn new(runner: &'a dyn ProcessRunner, name: &str) -> Self {
        Self {
            runner,
            pattern: version_pattern(name),
            flag: "--version".to_string(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            restricted_markers: DEFAULT_RESTRICTED_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    /// Override the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the restricted-distribution path markers.
    pub fn with_restricted_markers(mut self, markers: Vec<String>) -> Self {
        self.restricted_markers = markers;
        self
    }

    /// Run `target --version` and parse the result.
    pub fn probe(&self, target: &Path) -> Result<RuntimeDescriptor, DetectError> {
        let not_found = |reason: String| DetectError::NotFound {
            target: target.display().to_string(),
            reason,
        };

        let cmd = vec![target.to_string_lossy().into_owned(), self.flag.clone()];
        let output = self
            .runner
            .run(&cmd, &RunOptions::probe(self.timeout))
            .map_err(|e| not_found(e.to_string()))?;

        let merged = output.combined();
        let version = parse_version_output(&self.pattern, &merged).ok_or_else(|| {
            tracing::debug!("Unrecognised version output from {}: {:?}", target.display(), merged);
            not_found("no version in output".to_string())
        })?;

        Ok(RuntimeDescriptor {
            executable_path: target.to_path_buf(),
            version,
            restricted: self.is_restricted(target),
        })
    }

    /// Advisory check of the path against the restricted-distribution markers.
    pub fn is_restricted(&self, path: &Path) -> bool {
        let text = path.to_string_lossy().to_lowercase().replace('\\', "/");
        self.restricted_markers
            .iter()
            .any(|m| text.contains(&m.to_lowercase().replace('\\', "/")))
    }
}

fn version_pattern(name: &str) -> Regex {
    let pattern = format!(r"(?i)\b{}\s+(\d+)\.(\d+)\.(\d+)", regex::escape(name));
    Regex::new(&pattern).expect("escaped name always forms a valid pattern")
}

/// Extract the first `<name> X.Y.Z` triple from probe output whose
/// components fit in a `u32`.
pub fn parse_version_output(pattern: &Regex, output: &str) -> Option<VersionTuple> {
    pattern.captures_iter(output).find_map(|caps| {
        let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        Some(VersionTuple::new(num(1)?, num(2)?, num(3)?))
    })
}
