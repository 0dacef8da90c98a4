//! Host platform identity and privilege checks.

use std::fmt;

/// Platform family whose conventions drive path rewriting and privilege rules.
///
/// Chosen once at startup via [`HostPlatform::current`] and passed into the
/// components that need it, so each family's rules are testable on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Unix,
}

impl HostPlatform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }

    /// File name of an executable on this platform (`name.exe` on Windows).
    pub fn executable_name(&self, stem: &str) -> String {
        match self {
            HostPlatform::Windows if !stem.to_ascii_lowercase().ends_with(".exe") => {
                format!("{}.exe", stem)
            }
            _ => stem.to_string(),
        }
    }

    /// Whether path comparisons ignore case.
    pub fn case_insensitive_paths(&self) -> bool {
        matches!(self, HostPlatform::Windows)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPlatform::Windows => f.write_str("windows"),
            HostPlatform::Unix => f.write_str("unix"),
        }
    }
}

const CI_MARKERS: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_URL", "TF_BUILD"];

/// Whether this looks like a CI job, where nobody can answer prompts.
pub fn is_ci() -> bool {
    ci_detected(|name| std::env::var_os(name).is_some())
}

fn ci_detected(is_set: impl Fn(&str) -> bool) -> bool {
    CI_MARKERS.iter().any(|name| is_set(name))
}

/// Root on Unix, an elevated token on Windows. Decides whether environment
/// variables may be written machine-wide.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        // `net session` only succeeds from an elevated token.
        std::process::Command::new("net")
            .arg("session")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
