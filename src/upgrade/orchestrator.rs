//! The interpreter upgrade workflow.
//!
//! Detect the old interpreter, snapshot its packages, download an installer,
//! wait for the user to run it and name the result, then reinstall the
//! snapshot into the new interpreter. Every path through [`UpgradeOrchestrator::run`]
//! ends in a report with a terminal status and one next action.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::{DownloadResolver, Fetcher};
use crate::error::{ErrorKind, KamekError};
use crate::shell::{ProcessOutput, ProcessRunner, RunOptions};
use crate::toolchain::{
    Advisory, DetectError, PackageInstaller, PathResolver, RuntimeDescriptor, ToolchainDetector,
    VersionTuple,
};
use crate::ui::{Prompt, PromptResult, UserInterface};

use super::decision::{validate_new_path, PathDecision, SKIP_KEYWORD};
use super::session::{
    MigrationSnapshot, SessionStatus, StepFailure, UpgradeReport, UpgradeSession,
};
use super::snapshot::{parse_package_listing, Manifest};

/// Prompt keys, also usable as `KAMEK_PROMPT_<KEY>` overrides.
pub const CONTINUE_WITHOUT_MIGRATION_KEY: &str = "continue_without_migration";
pub const NEW_INTERPRETER_PATH_KEY: &str = "new_interpreter_path";

/// `pip freeze` can be slow on large environments.
const LISTING_TIMEOUT: Duration = Duration::from_secs(120);

/// Tunables for one upgrade run.
#[derive(Debug, Clone)]
pub struct UpgradeSettings {
    pub min_version: VersionTuple,
    /// `latest`, `X.Y.Z`, or a direct installer URL.
    pub version_token: String,
    pub os_filter: String,
    /// Where the installer and the transient manifest are written.
    pub download_dir: PathBuf,
    pub max_path_attempts: u32,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            min_version: VersionTuple::new(3, 8, 0),
            version_token: "latest".to_string(),
            os_filter: crate::download::OsFilter::for_host().to_string(),
            download_dir: std::env::temp_dir().join("kamek"),
            max_path_attempts: 5,
        }
    }
}

/// `Err` carries the next action once the session has reached a terminal status.
type Flow<T> = std::result::Result<T, String>;

/// Drives an [`UpgradeSession`] from detection to a terminal report.
pub struct UpgradeOrchestrator<'a> {
    runner: &'a dyn ProcessRunner,
    detector: &'a ToolchainDetector<'a>,
    resolver: &'a DownloadResolver<'a>,
    fetcher: &'a dyn Fetcher,
    path_resolver: PathResolver,
    settings: UpgradeSettings,
}

impl<'a> UpgradeOrchestrator<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        detector: &'a ToolchainDetector<'a>,
        resolver: &'a DownloadResolver<'a>,
        fetcher: &'a dyn Fetcher,
        settings: UpgradeSettings,
    ) -> Self {
        Self {
            runner,
            detector,
            resolver,
            fetcher,
            path_resolver: PathResolver::interpreter(detector.platform()),
            settings,
        }
    }

    /// Override how user-entered paths are mapped onto this host.
    pub fn with_path_resolver(mut self, resolver: PathResolver) -> Self {
        self.path_resolver = resolver;
        self
    }

    pub fn settings(&self) -> &UpgradeSettings {
        &self.settings
    }

    /// Run the whole workflow.
    ///
    /// `old_path` names the interpreter to replace; without it, `current`
    /// (the interpreter the caller already knows about) is used, and failing
    /// that the search path.
    pub fn run(
        &self,
        ui: &mut dyn UserInterface,
        old_path: Option<&Path>,
        current: Option<&RuntimeDescriptor>,
    ) -> UpgradeReport {
        let mut session = UpgradeSession::new(self.detector.platform());
        let next_action = match self.drive(&mut session, ui, old_path, current) {
            Ok(never) => match never {},
            Err(next_action) => next_action,
        };
        tracing::debug!("Upgrade finished: {}", session.status());
        session.report(Some(next_action))
    }

    fn drive(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        old_path: Option<&Path>,
        current: Option<&RuntimeDescriptor>,
    ) -> Flow<std::convert::Infallible> {
        ui.show_header("Python upgrade");

        let old = self.detect_old(session, ui, old_path, current)?;
        self.take_snapshot(session, ui, &old)?;
        let installer = self.download(session, ui)?;
        let new = self.confirm_new_path(session, ui, &old, &installer)?;
        Err(self.migrate(session, ui, &new))
    }

    fn detect_old(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        old_path: Option<&Path>,
        current: Option<&RuntimeDescriptor>,
    ) -> Flow<RuntimeDescriptor> {
        let mut spinner = ui.start_spinner("Detecting the current interpreter");
        let report =
            match self
                .detector
                .detect_interpreter(self.settings.min_version, old_path, current)
            {
                Ok(report) => report,
                Err(e) => {
                    spinner.finish_error(&e.to_string());
                    let next = self.detect_next_action(&e);
                    let err = KamekError::from(e);
                    session.abort(StepFailure::from_error("detect", &err));
                    return Err(next);
                }
            };

        spinner.finish_success(&format!(
            "Python {} at {}",
            report.runtime.version,
            report.runtime.executable_path.display()
        ));
        self.note_advisories(session, ui, report.advisories);
        session.old_runtime = Some(report.runtime.clone());
        advance(session, SessionStatus::OldDetected)?;
        Ok(report.runtime)
    }

    fn detect_next_action(&self, err: &DetectError) -> String {
        match err {
            DetectError::IncompatibleMajorVersion { .. } => {
                "Pass the path of a Python 3 interpreter with `kamek upgrade --python <path>`"
                    .to_string()
            }
            DetectError::VersionTooOld { .. } => format!(
                "Install Python {} or newer by hand, then rerun `kamek upgrade --python <path>`",
                self.settings.min_version
            ),
            DetectError::NotFound { .. } | DetectError::Unresolved { .. } => {
                "Pass the interpreter to replace with `kamek upgrade --python <path>`".to_string()
            }
        }
    }

    fn take_snapshot(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        old: &RuntimeDescriptor,
    ) -> Flow<()> {
        let pip = PackageInstaller::new(self.runner, &old.executable_path);
        let listing = pip.pip_command(&["freeze"]);

        let failure = match self.runner.run(&listing, &RunOptions::probe(LISTING_TIMEOUT)) {
            Ok(out) if out.success() => {
                let specifiers = parse_package_listing(&out.stdout);
                ui.success(&format!("Recorded {} installed packages", specifiers.len()));
                session.snapshot = Some(MigrationSnapshot {
                    package_specifiers: specifiers,
                    source_runtime: old.clone(),
                });
                return Ok(());
            }
            Ok(out) => exit_failure("pip freeze", &out),
            Err(e) => e.to_string(),
        };

        ui.warning(&format!("Could not list installed packages: {}", failure));
        session.record_failure(StepFailure::new(
            "snapshot",
            ErrorKind::ExternalFailure,
            failure,
        ));

        let prompt = Prompt::confirm(
            CONTINUE_WITHOUT_MIGRATION_KEY,
            "Continue the upgrade without migrating packages?",
        );
        let retry_hint = format!(
            "Make `{} -m pip freeze` succeed, then rerun `kamek upgrade`",
            old.executable_path.display()
        );
        match ui.prompt(&prompt) {
            Ok(PromptResult::Bool(true)) => {
                self.note_advisories(
                    session,
                    ui,
                    vec![Advisory::new(
                        "no_snapshot",
                        "Packages from the old interpreter will not be reinstalled",
                    )],
                );
                Ok(())
            }
            Ok(_) => {
                session.abort(StepFailure::new(
                    "snapshot",
                    ErrorKind::UserAborted,
                    "declined to continue without package migration",
                ));
                Err(retry_hint)
            }
            Err(e) => {
                session.abort(StepFailure::from_error("snapshot", &e));
                Err(retry_hint)
            }
        }
    }

    fn download(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
    ) -> Flow<PathBuf> {
        advance(session, SessionStatus::Downloading)?;

        let target = self
            .resolver
            .resolve(&self.settings.version_token, &self.settings.os_filter);
        self.note_advisories(session, ui, target.advisories.clone());
        if target.is_fallback {
            ui.warning(&format!("Using the fallback installer {}", target.resolved_url));
        }

        let dest = self.settings.download_dir.join(target.file_name());
        let url = target.resolved_url.clone();
        session.download = Some(target);

        ui.message(&format!("Downloading {}", url));
        match self.fetcher.fetch(&url, &dest) {
            Ok(file) => {
                ui.success(&format!(
                    "Downloaded {} ({} bytes)",
                    file.path.display(),
                    file.bytes
                ));
                ui.show_hint(&format!("SHA-256: {}", file.sha256));
                let path = file.path.clone();
                session.installer = Some(file);
                Ok(path)
            }
            Err(e) => {
                let err = KamekError::external("download", format!("{:#}", e));
                ui.error(&err.to_string());
                session.abort(StepFailure::from_error("download", &err));
                Err(format!(
                    "Check your connection and rerun `kamek upgrade`, or download {} yourself",
                    url
                ))
            }
        }
    }

    fn confirm_new_path(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        old: &RuntimeDescriptor,
        installer: &Path,
    ) -> Flow<RuntimeDescriptor> {
        advance(session, SessionStatus::AwaitingNewPathConfirmation)?;

        ui.message(&format!(
            "Run the installer at {} and finish it before continuing.",
            installer.display()
        ));
        ui.show_hint(&format!(
            "Then enter the full path of the new python executable, or '{}' to continue without migrating packages",
            SKIP_KEYWORD
        ));

        let prompt = Prompt::input(NEW_INTERPRETER_PATH_KEY, "Path to the new Python executable");
        let platform = self.detector.platform();
        let rerun = "Rerun `kamek upgrade` once the new interpreter is installed".to_string();

        for attempt in 1..=self.settings.max_path_attempts {
            let answer = match ui.prompt(&prompt) {
                Ok(answer) => answer.as_string(),
                Err(e) => {
                    session.abort(StepFailure::from_error("confirm_new_path", &e));
                    return Err(rerun);
                }
            };

            let mut new_advisories = Vec::new();
            let decision = validate_new_path(&answer, old, &self.path_resolver, platform, |path| {
                let report = self
                    .detector
                    .verify_interpreter(path, self.settings.min_version)?;
                new_advisories = report.advisories;
                Ok(report.runtime)
            });

            match decision {
                PathDecision::Accept(runtime) => {
                    ui.success(&format!(
                        "New interpreter: Python {} at {}",
                        runtime.version,
                        runtime.executable_path.display()
                    ));
                    self.note_advisories(session, ui, new_advisories);
                    session.new_runtime = Some(runtime.clone());
                    return Ok(runtime);
                }
                PathDecision::Retry(reason) => {
                    tracing::debug!("Rejected new path (attempt {}): {}", attempt, reason);
                    ui.warning(&reason);
                }
                PathDecision::Skip => {
                    session.snapshot = None;
                    self.note_advisories(
                        session,
                        ui,
                        vec![Advisory::new(
                            "migration_skipped",
                            "No packages were migrated to the new interpreter",
                        )],
                    );
                    advance(session, SessionStatus::Completed)?;
                    return Err(
                        "Run `kamek packages --python <new interpreter>` to install the required packages"
                            .to_string(),
                    );
                }
            }
        }

        session.abort(StepFailure::new(
            "confirm_new_path",
            ErrorKind::UserAborted,
            format!(
                "no valid interpreter path after {} attempts",
                self.settings.max_path_attempts
            ),
        ));
        Err(rerun)
    }

    /// Runs the migration and returns the next action; the session is terminal afterwards.
    fn migrate(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        new: &RuntimeDescriptor,
    ) -> String {
        let packages_hint = format!(
            "Run `kamek packages --python {}` to install the required packages",
            new.executable_path.display()
        );

        if session.snapshot.is_none() {
            self.note_advisories(
                session,
                ui,
                vec![Advisory::new(
                    "no_migration",
                    "No package snapshot was taken, so nothing was migrated",
                )],
            );
            return finish(session, SessionStatus::Completed, packages_hint);
        }

        let snapshot = match session.begin_migration() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                session.abort(StepFailure::from_error("migrate", &e));
                return packages_hint;
            }
        };

        let pip = PackageInstaller::new(self.runner, &new.executable_path);
        self.upgrade_package_manager(session, ui, &pip);

        if snapshot.package_specifiers.is_empty() {
            ui.message("The old interpreter had no packages to migrate");
            return finish(session, SessionStatus::Completed, packages_hint);
        }

        let manifest = match Manifest::write(&self.settings.download_dir, &snapshot.package_specifiers) {
            Ok(manifest) => manifest,
            Err(e) => {
                let err = KamekError::Io(e);
                ui.error(&format!("Could not write the package manifest: {}", err));
                session.record_failure(StepFailure::from_error("reinstall_packages", &err));
                return finish(
                    session,
                    SessionStatus::PartialFailure,
                    format!(
                        "Make {} writable, then reinstall your packages with `{} -m pip install <package>`",
                        self.settings.download_dir.display(),
                        new.executable_path.display()
                    ),
                );
            }
        };

        ui.message(&format!(
            "Reinstalling {} packages into the new interpreter",
            snapshot.package_specifiers.len()
        ));
        let manifest_arg = manifest.path().to_string_lossy().into_owned();
        let outcome = self.runner.run(
            &pip.pip_command(&["install", "-r", &manifest_arg]),
            &RunOptions::streaming(),
        );
        manifest.remove();

        let failure = match outcome {
            Ok(out) if out.success() => None,
            Ok(out) => Some(exit_failure("pip install -r", &out)),
            Err(e) => Some(e.to_string()),
        };

        match failure {
            None => {
                session.migrated_packages = snapshot.package_specifiers.len();
                ui.success(&format!(
                    "Migrated {} packages",
                    snapshot.package_specifiers.len()
                ));
                finish(
                    session,
                    SessionStatus::Completed,
                    format!(
                        "Use {} from now on; `kamek check --python {}` verifies the toolchain",
                        new.executable_path.display(),
                        new.executable_path.display()
                    ),
                )
            }
            Some(message) => {
                ui.error(&format!("Package reinstall failed: {}", message));
                session.record_failure(StepFailure::new(
                    "reinstall_packages",
                    ErrorKind::ExternalFailure,
                    message,
                ));
                finish(
                    session,
                    SessionStatus::PartialFailure,
                    format!(
                        "Check the pip output above and install the missing packages with `{} -m pip install <package>`",
                        new.executable_path.display()
                    ),
                )
            }
        }
    }

    /// Best-effort; failure is recorded and the migration carries on.
    fn upgrade_package_manager(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        pip: &PackageInstaller<'_>,
    ) {
        ui.message("Upgrading pip in the new interpreter");
        let failure = match self.runner.run(
            &pip.pip_command(&["install", "--upgrade", "pip"]),
            &RunOptions::streaming(),
        ) {
            Ok(out) if out.success() => return,
            Ok(out) => exit_failure("pip self-upgrade", &out),
            Err(e) => e.to_string(),
        };

        session.record_failure(StepFailure::new(
            "upgrade_pip",
            ErrorKind::ExternalFailure,
            failure.clone(),
        ));
        self.note_advisories(
            session,
            ui,
            vec![Advisory::new(
                "package_manager_upgrade_failed",
                format!("pip could not upgrade itself ({}); continuing", failure),
            )],
        );
    }

    fn note_advisories(
        &self,
        session: &mut UpgradeSession,
        ui: &mut dyn UserInterface,
        advisories: Vec<Advisory>,
    ) {
        for advisory in advisories {
            ui.advisory(&advisory);
            session.advisories.push(advisory);
        }
    }
}

/// Transition, aborting the session if the move is not allowed.
fn advance(session: &mut UpgradeSession, to: SessionStatus) -> Flow<()> {
    session.transition(to).map_err(|e| {
        session.abort(StepFailure::from_error("session", &e));
        "Rerun `kamek upgrade --debug` and report the log".to_string()
    })
}

fn finish(session: &mut UpgradeSession, status: SessionStatus, next_action: String) -> String {
    match advance(session, status) {
        Ok(()) => next_action,
        Err(next) => next,
    }
}

fn exit_failure(what: &str, out: &ProcessOutput) -> String {
    let code = out
        .exit_code
        .map_or("a signal".to_string(), |c| format!("code {}", c));
    let detail = out.stderr.lines().rev().find(|l| !l.trim().is_empty());
    match detail {
        Some(line) => format!("{} exited with {}: {}", what, code, line.trim()),
        None => format!("{} exited with {}", what, code),
    }
}
