//! Cross-platform path resolution for recorded toolchain locations.
//!
//! Toolchain roots are often recorded by tools that follow a different
//! platform's conventions than the one running now: devkitPro's MSYS2 shell
//! on Windows writes `DEVKITPRO=/opt/devkitpro`, and configs copied from a
//! Windows machine carry `C:\devkitPro`. [`PathResolver`] maps such values
//! onto an existing path using a fixed, ordered rule set and reports
//! [`DetectError::Unresolved`] rather than guessing.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::shell::HostPlatform;

use super::status::DetectError;

/// Where devkitPro installs itself on Unix hosts.
pub const DEVKITPRO_UNIX_ROOT: &str = "/opt/devkitpro";

/// Drives searched for `X:\devkitPro` on Windows, in order.
const WINDOWS_DRIVES: &[char] = &['C', 'D', 'E', 'F', 'G'];

/// A single rewrite from a foreign convention to a local candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// A foreign absolute prefix maps to local installation roots, tried in
    /// order, with the remaining subpath preserved.
    ForeignPrefix { prefix: String, roots: Vec<PathBuf> },

    /// An MSYS-style drive path (`/c/dir`) maps to the drive path (`C:/dir`).
    DriveLetter,
}

impl RewriteRule {
    /// Candidates this rule produces for a slash-normalised value, plus the
    /// subpath after a matched foreign prefix. Drive-letter matches carry no
    /// subpath: the rest of `/d/...` is relative to that drive, not to an
    /// installation root.
    fn candidates(&self, normalized: &str) -> Option<(Vec<PathBuf>, Option<String>)> {
        match self {
            RewriteRule::ForeignPrefix { prefix, roots } => {
                let sub = strip_prefix_ci(normalized, prefix)?;
                let sub = sub.trim_start_matches('/').to_string();
                let paths = roots.iter().map(|root| join_subpath(root, &sub)).collect();
                Some((paths, Some(sub)))
            }
            RewriteRule::DriveLetter => {
                let bytes = normalized.as_bytes();
                let is_drive = bytes.len() >= 2
                    && bytes[0] == b'/'
                    && bytes[1].is_ascii_alphabetic()
                    && (bytes.len() == 2 || bytes[2] == b'/');
                if !is_drive {
                    return None;
                }
                let letter = (bytes[1] as char).to_ascii_uppercase();
                let rest = normalized[2..].trim_start_matches('/');
                Some((vec![PathBuf::from(format!("{}:/{}", letter, rest))], None))
            }
        }
    }
}

/// Case-insensitive prefix strip that only matches on a path boundary.
fn strip_prefix_ci<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if value.len() < prefix.len() || !value.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = value.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn join_subpath(root: &Path, sub: &str) -> PathBuf {
    sub.split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// A successfully resolved toolchain location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainLocation {
    /// The value as recorded (env var, config, user input).
    pub raw_value: String,
    /// The existing path it maps to on this machine.
    pub resolved_path: PathBuf,
    /// Whether a rewrite rule or fallback root was needed.
    pub was_rewritten: bool,
    /// Always true for a resolved location; kept for diagnostics output.
    pub exists: bool,
}

/// Maps recorded paths onto existing local paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    rules: Vec<RewriteRule>,
    fallback_roots: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(rules: Vec<RewriteRule>, fallback_roots: Vec<PathBuf>) -> Self {
        Self {
            rules,
            fallback_roots,
        }
    }

    /// A resolver that only accepts paths that already exist.
    pub fn identity() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Rule set for devkitPro locations on the given platform.
    pub fn devkitpro(platform: HostPlatform) -> Self {
        match platform {
            HostPlatform::Windows => {
                let roots: Vec<PathBuf> = WINDOWS_DRIVES
                    .iter()
                    .map(|d| PathBuf::from(format!("{}:\\devkitPro", d)))
                    .collect();
                Self::new(
                    vec![
                        RewriteRule::ForeignPrefix {
                            prefix: DEVKITPRO_UNIX_ROOT.to_string(),
                            roots: roots.clone(),
                        },
                        RewriteRule::DriveLetter,
                    ],
                    vec![roots[0].clone()],
                )
            }
            HostPlatform::Unix => Self::new(
                vec![RewriteRule::ForeignPrefix {
                    prefix: "c:/devkitpro".to_string(),
                    roots: vec![PathBuf::from(DEVKITPRO_UNIX_ROOT)],
                }],
                vec![PathBuf::from(DEVKITPRO_UNIX_ROOT)],
            ),
        }
    }

    /// Rule set for user-supplied interpreter paths (MSYS drive paths only).
    pub fn interpreter(platform: HostPlatform) -> Self {
        match platform {
            HostPlatform::Windows => Self::new(vec![RewriteRule::DriveLetter], Vec::new()),
            HostPlatform::Unix => Self::identity(),
        }
    }

    /// Ordered rewrite candidates for `raw`, without touching the filesystem.
    ///
    /// Rule candidates come first, then fallback roots (with the subpath of
    /// the first foreign-prefix match, if any).
    pub fn candidates(&self, raw: &str) -> Vec<PathBuf> {
        let normalized = raw.trim().replace('\\', "/");
        let mut out = Vec::new();
        let mut matched_sub: Option<String> = None;

        for rule in &self.rules {
            if let Some((paths, sub)) = rule.candidates(&normalized) {
                out.extend(paths);
                if matched_sub.is_none() {
                    matched_sub = sub;
                }
            }
        }

        for root in &self.fallback_roots {
            let candidate = match &matched_sub {
                Some(sub) => join_subpath(root, sub),
                None => root.clone(),
            };
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }

    /// Resolve `raw` to an existing path.
    pub fn resolve(&self, raw: &str) -> Result<ToolchainLocation, DetectError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DetectError::Unresolved {
                raw: raw.to_string(),
            });
        }

        let direct = Path::new(trimmed);
        if direct.exists() {
            return Ok(ToolchainLocation {
                raw_value: raw.to_string(),
                resolved_path: direct.to_path_buf(),
                was_rewritten: false,
                exists: true,
            });
        }

        for candidate in self.candidates(trimmed) {
            if candidate.exists() {
                tracing::debug!(
                    "Resolved '{}' to {} via rewrite",
                    trimmed,
                    candidate.display()
                );
                return Ok(ToolchainLocation {
                    raw_value: raw.to_string(),
                    resolved_path: candidate,
                    was_rewritten: true,
                    exists: true,
                });
            }
            tracing::debug!("Rewrite candidate {} does not exist", candidate.display());
        }

        Err(DetectError::Unresolved {
            raw: raw.to_string(),
        })
    }
}

/// Compare two paths as the host platform would.
///
/// Both sides are canonicalised when possible; on case-insensitive
/// platforms the comparison ignores case.
pub fn same_path(a: &Path, b: &Path, platform: HostPlatform) -> bool {
    let a = a.canonicalize().unwrap_or_else(|_| a.to_path_buf());
    let b = b.canonicalize().unwrap_or_else(|_| b.to_path_buf());
    if platform.case_insensitive_paths() {
        let norm = |p: &Path| {
            p.to_string_lossy()
                .replace('\\', "/")
                .trim_end_matches('/')
                .to_lowercase()
        };
        norm(&a) == norm(&b)
    } else {
        a == b
    }
}
