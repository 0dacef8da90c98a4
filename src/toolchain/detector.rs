//! Presence, version, and compatibility verdicts for the toolchain.
//!
//! [`ToolchainDetector`] composes [`VersionProbe`] and [`PathResolver`]. It
//! answers two questions: is there a usable Python interpreter, and is the
//! devkitPro compiler suite installed where its environment variable says.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shell::{EnvAccess, HostPlatform, ProcessRunner};

use super::paths::{same_path, PathResolver, ToolchainLocation};
use super::status::{Advisory, DetectError};
use super::version::{RuntimeDescriptor, VersionProbe, VersionTuple, DEFAULT_PROBE_TIMEOUT};

/// Name matched in interpreter `--version` output.
pub const INTERPRETER_NAME: &str = "Python";

/// The generically-named command checked for ambiguous invocation.
pub const GENERIC_COMMAND: &str = "python";

/// On-disk layout of the compiler suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteLayout {
    /// Environment variable naming the suite root.
    pub env_var: String,

    /// Marker executable, relative to the root.
    pub marker: String,

    /// Subdirectory holding the suite's compiler binaries.
    pub compiler_dir: String,

    /// Environment variable that should point at `compiler_dir`.
    pub compiler_env_var: String,

    /// Shared runtime `bin` directory, relative to the root.
    pub runtime_bin: String,
}

impl Default for SuiteLayout {
    fn default() -> Self {
        Self {
            env_var: "DEVKITPRO".to_string(),
            marker: "tools/bin/elf2dol".to_string(),
            compiler_dir: "devkitPPC".to_string(),
            compiler_env_var: "DEVKITPPC".to_string(),
            runtime_bin: "msys2/usr/bin".to_string(),
        }
    }
}

/// A usable interpreter plus anything worth warning about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpreterReport {
    pub runtime: RuntimeDescriptor,
    pub advisories: Vec<Advisory>,
}

/// Result of inspecting the compiler suite.
///
/// Present means the root resolved to a directory. The other checks are
/// advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerSuiteReport {
    pub location: ToolchainLocation,
    pub marker_found: bool,
    pub compiler_dir_found: bool,
    pub runtime_bin_on_path: bool,
    pub advisories: Vec<Advisory>,
}

impl CompilerSuiteReport {
    pub fn compiler_dir(&self, layout: &SuiteLayout) -> PathBuf {
        join_relative(&self.location.resolved_path, &layout.compiler_dir)
    }
}

/// Detects interpreters and the compiler suite.
pub struct ToolchainDetector<'a> {
    runner: &'a dyn ProcessRunner,
    env: &'a dyn EnvAccess,
    platform: HostPlatform,
    search_path: Vec<PathBuf>,
    suite_resolver: PathResolver,
    layout: SuiteLayout,
    probe_timeout: Duration,
    restricted_markers: Option<Vec<String>>,
}

impl<'a> ToolchainDetector<'a> {
    /// Create a detector whose search path comes from `PATH` in `env`.
    pub fn new(
        runner: &'a dyn ProcessRunner,
        env: &'a dyn EnvAccess,
        platform: HostPlatform,
    ) -> Self {
        let search_path = env
            .get("PATH")
            .map(|p| std::env::split_paths(&OsString::from(p)).collect())
            .unwrap_or_default();
        Self {
            runner,
            env,
            platform,
            search_path,
            suite_resolver: PathResolver::devkitpro(platform),
            layout: SuiteLayout::default(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            restricted_markers: None,
        }
    }

    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_suite_resolver(mut self, resolver: PathResolver) -> Self {
        self.suite_resolver = resolver;
        self
    }

    pub fn with_layout(mut self, layout: SuiteLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_restricted_markers(mut self, markers: Vec<String>) -> Self {
        self.restricted_markers = Some(markers);
        self
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn layout(&self) -> &SuiteLayout {
        &self.layout
    }

    fn probe(&self) -> VersionProbe<'a> {
        let probe = VersionProbe::new(self.runner, INTERPRETER_NAME).with_timeout(self.probe_timeout);
        match &self.restricted_markers {
            Some(markers) => probe.with_restricted_markers(markers.clone()),
            None => probe,
        }
    }

    /// Find `command` on the detector's search path.
    pub fn locate(&self, command: &str) -> Option<PathBuf> {
        let paths = std::env::join_paths(&self.search_path).ok()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(command, Some(paths), cwd).ok()
    }

    /// Commands tried, in order, when no interpreter is named.
    fn default_commands(&self) -> &'static [&'static str] {
        match self.platform {
            HostPlatform::Windows => &["python", "py", "python3"],
            HostPlatform::Unix => &["python3", "python"],
        }
    }

    /// Find and vet an interpreter.
    ///
    /// Target order: `explicit` if given, else `current` (used as-is, not
    /// re-probed), else the first default command on the search path.
    pub fn detect_interpreter(
        &self,
        min_version: VersionTuple,
        explicit: Option<&Path>,
        current: Option<&RuntimeDescriptor>,
    ) -> Result<InterpreterReport, DetectError> {
        let runtime = match (explicit, current) {
            (Some(path), _) => {
                let target = self.expand_command(path);
                self.probe().probe(&target)?
            }
            (None, Some(current)) => current.clone(),
            (None, None) => {
                let target = self
                    .default_commands()
                    .iter()
                    .find_map(|cmd| self.locate(cmd))
                    .ok_or_else(|| DetectError::NotFound {
                        target: "python".to_string(),
                        reason: "no interpreter on the search path".to_string(),
                    })?;
                self.probe().probe(&target)?
            }
        };

        self.verify(runtime, min_version)
    }

    /// Probe a specific executable and apply the version rules.
    pub fn verify_interpreter(
        &self,
        path: &Path,
        min_version: VersionTuple,
    ) -> Result<InterpreterReport, DetectError> {
        let runtime = self.probe().probe(path)?;
        self.verify(runtime, min_version)
    }

    fn verify(
        &self,
        runtime: RuntimeDescriptor,
        min_version: VersionTuple,
    ) -> Result<InterpreterReport, DetectError> {
        if runtime.version.major == 2 {
            return Err(DetectError::IncompatibleMajorVersion {
                found: runtime.version,
            });
        }
        if runtime.version < min_version {
            return Err(DetectError::VersionTooOld {
                found: runtime.version,
                required: min_version,
            });
        }

        let mut advisories = Vec::new();
        if runtime.restricted {
            advisories.push(Advisory::new(
                "restricted_distribution",
                format!(
                    "{} looks like a sandboxed store or snap install; it may be unable to \
                     write outside its own directories. A python.org install is recommended.",
                    runtime.executable_path.display()
                ),
            ));
        }
        if let Some(advisory) = self.ambiguous_generic(&runtime) {
            advisories.push(advisory);
        }

        tracing::debug!(
            "Accepted interpreter {} ({})",
            runtime.executable_path.display(),
            runtime.version
        );
        Ok(InterpreterReport {
            runtime,
            advisories,
        })
    }

    /// Warn when plain `python` would run a different major version.
    fn ambiguous_generic(&self, runtime: &RuntimeDescriptor) -> Option<Advisory> {
        let generic = self.locate(GENERIC_COMMAND)?;
        if same_path(&generic, &runtime.executable_path, self.platform) {
            return None;
        }
        let other = self.probe().probe(&generic).ok()?;
        if other.version.major == runtime.version.major {
            return None;
        }
        Some(Advisory::new(
            "ambiguous_command",
            format!(
                "`{}` on PATH is Python {} ({}), not {}; invoke the interpreter by full path",
                GENERIC_COMMAND,
                other.version,
                generic.display(),
                runtime.version
            ),
        ))
    }

    /// Bare command names are looked up on the search path.
    fn expand_command(&self, path: &Path) -> PathBuf {
        let is_bare = path.components().count() == 1 && !path.exists();
        if is_bare {
            if let Some(found) = self.locate(&path.to_string_lossy()) {
                return found;
            }
        }
        path.to_path_buf()
    }

    /// Inspect the compiler suite named by the layout's environment variable.
    pub fn detect_compiler_suite(&self) -> Result<CompilerSuiteReport, DetectError> {
        let layout = &self.layout;
        let raw = self
            .env
            .get(&layout.env_var)
            .ok_or_else(|| DetectError::NotFound {
                target: layout.env_var.clone(),
                reason: "environment variable is not set".to_string(),
            })?;

        let location = self.suite_resolver.resolve(&raw)?;
        if !location.resolved_path.is_dir() {
            return Err(DetectError::Unresolved { raw });
        }
        let root = location.resolved_path.clone();

        let mut advisories = Vec::new();
        if location.was_rewritten {
            advisories.push(Advisory::new(
                "rewritten_location",
                format!(
                    "{} is '{}', which was mapped to {}; consider updating the variable",
                    layout.env_var,
                    raw,
                    root.display()
                ),
            ));
        }

        let marker = join_relative(&root, &self.platform.executable_name(&layout.marker));
        let marker_found = marker.is_file();
        if !marker_found {
            advisories.push(Advisory::new(
                "marker_missing",
                format!("{} not found; the installation may be incomplete", marker.display()),
            ));
        }

        let compiler_dir = join_relative(&root, &layout.compiler_dir);
        let compiler_dir_found = compiler_dir.is_dir();
        if !compiler_dir_found {
            advisories.push(Advisory::new(
                "compiler_dir_missing",
                format!(
                    "{} not found; install the {} package",
                    compiler_dir.display(),
                    layout.compiler_dir
                ),
            ));
        }

        let runtime_bin = join_relative(&root, &layout.runtime_bin);
        let runtime_bin_on_path = self
            .search_path
            .iter()
            .any(|entry| same_path(entry, &runtime_bin, self.platform));
        if !runtime_bin_on_path {
            advisories.push(Advisory::new(
                "runtime_bin_not_on_path",
                format!("Add {} to PATH", runtime_bin.display()),
            ));
        }

        advisories.extend(self.compiler_env_advisory(&compiler_dir));

        Ok(CompilerSuiteReport {
            location,
            marker_found,
            compiler_dir_found,
            runtime_bin_on_path,
            advisories,
        })
    }

    fn compiler_env_advisory(&self, compiler_dir: &Path) -> Option<Advisory> {
        let var = &self.layout.compiler_env_var;
        let Some(value) = self.env.get(var) else {
            return Some(Advisory::new(
                "compiler_env_unset",
                format!("{} is not set; set it to {}", var, compiler_dir.display()),
            ));
        };

        let matches = self
            .suite_resolver
            .resolve(&value)
            .map(|loc| same_path(&loc.resolved_path, compiler_dir, self.platform))
            .unwrap_or(false);
        if matches {
            None
        } else {
            Some(Advisory::new(
                "compiler_env_mismatch",
                format!(
                    "{} is '{}' but the suite's compiler directory is {}",
                    var,
                    value,
                    compiler_dir.display()
                ),
            ))
        }
    }
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{ScriptedRunner, StaticEnv};
    use std::fs;
    use tempfile::TempDir;

    fn descriptor(path: &str, version: VersionTuple) -> RuntimeDescriptor {
        RuntimeDescriptor {
            executable_path: PathBuf::from(path),
            version,
            restricted: false,
        }
    }

    #[test]
    fn explicit_path_is_probed() {
        let runner = ScriptedRunner::new().respond(&["/opt/py/python3"], 0, "Python 3.8.10\n");
        let env = StaticEnv::new();
        let detector =
            ToolchainDetector::new(&runner, &env, HostPlatform::Unix).with_search_path(vec![]);

        let report = detector
            .detect_interpreter(
                VersionTuple::new(3, 8, 0),
                Some(Path::new("/opt/py/python3")),
                None,
            )
            .unwrap();
        assert_eq!(report.runtime.version, VersionTuple::new(3, 8, 10));
        assert!(report.advisories.is_empty());
    }

    #[test]
    fn python_two_is_rejected_regardless_of_minimum() {
        let runner = ScriptedRunner::new().respond_full(&["/usr/bin/python"], 0, "", "Python 2.7.18\n");
        let env = StaticEnv::new();
        let detector =
            ToolchainDetector::new(&runner, &env, HostPlatform::Unix).with_search_path(vec![]);

        for min in [VersionTuple::new(0, 0, 0), VersionTuple::new(2, 0, 0), VersionTuple::new(3, 8, 0)] {
            let err = detector
                .detect_interpreter(min, Some(Path::new("/usr/bin/python")), None)
                .unwrap_err();
            assert!(matches!(err, DetectError::IncompatibleMajorVersion { .. }));
        }
    }

    #[test]
    fn older_than_minimum_is_too_old() {
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new();
        let detector =
            ToolchainDetector::new(&runner, &env, HostPlatform::Unix).with_search_path(vec![]);
        let current = descriptor("/usr/bin/python3", VersionTuple::new(3, 6, 9));

        let err = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, Some(&current))
            .unwrap_err();
        assert_eq!(
            err,
            DetectError::VersionTooOld {
                found: VersionTuple::new(3, 6, 9),
                required: VersionTuple::new(3, 8, 0),
            }
        );
    }

    #[test]
    fn current_runtime_is_used_without_probing() {
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new();
        let detector =
            ToolchainDetector::new(&runner, &env, HostPlatform::Unix).with_search_path(vec![]);
        let current = descriptor("/fabricated/python", VersionTuple::new(3, 12, 4));

        let report = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, Some(&current))
            .unwrap();
        assert_eq!(report.runtime, current);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn nothing_on_search_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current())
            .with_search_path(vec![temp.path().to_path_buf()]);

        let err = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, None)
            .unwrap_err();
        assert!(matches!(err, DetectError::NotFound { .. }));
    }

    #[test]
    fn restricted_distribution_is_advisory_only() {
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new();
        let detector =
            ToolchainDetector::new(&runner, &env, HostPlatform::Unix).with_search_path(vec![]);
        let mut current = descriptor("/snap/bin/python3", VersionTuple::new(3, 10, 12));
        current.restricted = true;

        let report = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, Some(&current))
            .unwrap();
        assert_eq!(report.advisories.len(), 1);
        assert_eq!(report.advisories[0].code, "restricted_distribution");
    }

    #[cfg(unix)]
    fn fake_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn search_path_prefers_python3() {
        let temp = TempDir::new().unwrap();
        let python3 = fake_executable(temp.path(), "python3");
        let runner = ScriptedRunner::new().respond(&[python3.to_str().unwrap()], 0, "Python 3.11.2");
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::Unix)
            .with_search_path(vec![temp.path().to_path_buf()]);

        let report = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, None)
            .unwrap();
        assert_eq!(report.runtime.executable_path, python3);
    }

    #[cfg(unix)]
    #[test]
    fn generic_command_with_other_major_is_ambiguous() {
        let temp = TempDir::new().unwrap();
        let python3 = fake_executable(temp.path(), "python3");
        let python = fake_executable(temp.path(), "python");
        let runner = ScriptedRunner::new()
            .respond(&[python3.to_str().unwrap()], 0, "Python 3.11.2")
            .respond_full(&[python.to_str().unwrap()], 0, "", "Python 2.7.18");
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::Unix)
            .with_search_path(vec![temp.path().to_path_buf()]);

        let report = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, None)
            .unwrap();
        assert!(report.advisories.iter().any(|a| a.code == "ambiguous_command"));
    }

    #[cfg(unix)]
    #[test]
    fn generic_command_with_same_major_is_fine() {
        let temp = TempDir::new().unwrap();
        let python3 = fake_executable(temp.path(), "python3");
        let python = fake_executable(temp.path(), "python");
        let runner = ScriptedRunner::new()
            .respond(&[python3.to_str().unwrap()], 0, "Python 3.11.2")
            .respond(&[python.to_str().unwrap()], 0, "Python 3.9.1");
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::Unix)
            .with_search_path(vec![temp.path().to_path_buf()]);

        let report = detector
            .detect_interpreter(VersionTuple::new(3, 8, 0), None, None)
            .unwrap();
        assert!(report.advisories.is_empty());
    }

    #[test]
    fn missing_suite_variable_is_not_found() {
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current());

        let err = detector.detect_compiler_suite().unwrap_err();
        assert!(matches!(err, DetectError::NotFound { ref target, .. } if target == "DEVKITPRO"));
    }

    #[test]
    fn unresolvable_suite_root_is_unresolved() {
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new().with("DEVKITPRO", "/no/such/devkitpro");
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current())
            .with_suite_resolver(PathResolver::identity());

        let err = detector.detect_compiler_suite().unwrap_err();
        assert!(matches!(err, DetectError::Unresolved { .. }));
    }

    #[test]
    fn suite_root_that_is_a_file_is_unresolved() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("devkitpro.txt");
        fs::write(&file, "").unwrap();
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new().with("DEVKITPRO", &file.to_string_lossy());
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current());

        assert!(matches!(
            detector.detect_compiler_suite().unwrap_err(),
            DetectError::Unresolved { .. }
        ));
    }

    #[test]
    fn bare_suite_root_is_present_with_advisories() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new().with("DEVKITPRO", &temp.path().to_string_lossy());
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current())
            .with_search_path(vec![]);

        let report = detector.detect_compiler_suite().unwrap();
        assert!(!report.marker_found);
        assert!(!report.compiler_dir_found);
        assert!(!report.runtime_bin_on_path);
        let codes: Vec<&str> = report.advisories.iter().map(|a| a.code.as_str()).collect();
        assert!(codes.contains(&"marker_missing"));
        assert!(codes.contains(&"compiler_dir_missing"));
        assert!(codes.contains(&"runtime_bin_not_on_path"));
        assert!(codes.contains(&"compiler_env_unset"));
    }

    #[test]
    fn complete_suite_has_no_advisories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let platform = HostPlatform::current();
        fs::create_dir_all(root.join("tools").join("bin")).unwrap();
        fs::write(
            root.join("tools").join("bin").join(platform.executable_name("elf2dol")),
            "",
        )
        .unwrap();
        fs::create_dir_all(root.join("devkitPPC")).unwrap();
        let runtime_bin = root.join("msys2").join("usr").join("bin");
        fs::create_dir_all(&runtime_bin).unwrap();

        let runner = ScriptedRunner::new();
        let env = StaticEnv::new()
            .with("DEVKITPRO", &root.to_string_lossy())
            .with("DEVKITPPC", &root.join("devkitPPC").to_string_lossy());
        let detector = ToolchainDetector::new(&runner, &env, platform)
            .with_search_path(vec![runtime_bin]);

        let report = detector.detect_compiler_suite().unwrap();
        assert!(report.marker_found);
        assert!(report.compiler_dir_found);
        assert!(report.runtime_bin_on_path);
        assert!(report.advisories.is_empty(), "{:?}", report.advisories);
    }

    #[test]
    fn mismatched_compiler_variable_is_flagged() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("dkp");
        let elsewhere = temp.path().join("old-ppc");
        fs::create_dir_all(root.join("devkitPPC")).unwrap();
        fs::create_dir_all(&elsewhere).unwrap();

        let runner = ScriptedRunner::new();
        let env = StaticEnv::new()
            .with("DEVKITPRO", &root.to_string_lossy())
            .with("DEVKITPPC", &elsewhere.to_string_lossy());
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current())
            .with_search_path(vec![]);

        let report = detector.detect_compiler_suite().unwrap();
        assert!(report
            .advisories
            .iter()
            .any(|a| a.code == "compiler_env_mismatch"));
    }

    #[test]
    fn rewritten_suite_root_is_reported() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("devkitPro");
        fs::create_dir_all(&root).unwrap();
        let resolver = PathResolver::new(
            vec![super::super::paths::RewriteRule::ForeignPrefix {
                prefix: "/opt/devkitpro".to_string(),
                roots: vec![root.clone()],
            }],
            vec![],
        );
        let runner = ScriptedRunner::new();
        let env = StaticEnv::new().with("DEVKITPRO", "/opt/devkitpro");
        let detector = ToolchainDetector::new(&runner, &env, HostPlatform::current())
            .with_suite_resolver(resolver)
            .with_search_path(vec![]);

        let report = detector.detect_compiler_suite().unwrap();
        assert!(report.location.was_rewritten);
        assert_eq!(report.location.resolved_path, root);
        assert!(report.advisories.iter().any(|a| a.code == "rewritten_location"));
    }
}
