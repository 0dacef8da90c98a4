//! Upgrade session state.
//!
//! An [`UpgradeSession`] only ever moves forward through its statuses, with
//! one exception: any non-terminal status may jump to `Aborted`. The
//! transition into `Migrating` additionally requires a snapshot and a
//! confirmed new runtime distinct from the old one.

use std::fmt;

use serde::Serialize;

use crate::download::{DownloadTarget, FetchedFile};
use crate::error::{ErrorKind, KamekError, Result};
use crate::shell::HostPlatform;
use crate::toolchain::{same_path, Advisory, RuntimeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    OldDetected,
    Downloading,
    AwaitingNewPathConfirmation,
    Migrating,
    Completed,
    Aborted,
    PartialFailure,
}

impl SessionStatus {
    /// Position in the forward order. Terminal statuses share the last rank.
    fn rank(&self) -> u8 {
        match self {
            SessionStatus::Started => 0,
            SessionStatus::OldDetected => 1,
            SessionStatus::Downloading => 2,
            SessionStatus::AwaitingNewPathConfirmation => 3,
            SessionStatus::Migrating => 4,
            SessionStatus::Completed | SessionStatus::Aborted | SessionStatus::PartialFailure => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Aborted | SessionStatus::PartialFailure
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Started => "started",
            SessionStatus::OldDetected => "old runtime detected",
            SessionStatus::Downloading => "downloading",
            SessionStatus::AwaitingNewPathConfirmation => "awaiting new path",
            SessionStatus::Migrating => "migrating",
            SessionStatus::Completed => "completed",
            SessionStatus::Aborted => "aborted",
            SessionStatus::PartialFailure => "partial failure",
        };
        f.write_str(name)
    }
}

/// Packages installed in the old runtime, captured before the upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSnapshot {
    pub package_specifiers: Vec<String>,
    pub source_runtime: RuntimeDescriptor,
}

/// A step that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl StepFailure {
    pub fn new(step: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(step: impl Into<String>, err: &KamekError) -> Self {
        Self::new(step, err.kind(), err.to_string())
    }
}

/// The record an upgrade run works on.
#[derive(Debug, Clone)]
pub struct UpgradeSession {
    platform: HostPlatform,
    status: SessionStatus,
    pub old_runtime: Option<RuntimeDescriptor>,
    pub new_runtime: Option<RuntimeDescriptor>,
    pub snapshot: Option<MigrationSnapshot>,
    pub download: Option<DownloadTarget>,
    pub installer: Option<FetchedFile>,
    pub migrated_packages: usize,
    pub failures: Vec<StepFailure>,
    pub advisories: Vec<Advisory>,
    abort: Option<StepFailure>,
}

impl UpgradeSession {
    pub fn new(platform: HostPlatform) -> Self {
        Self {
            platform,
            status: SessionStatus::Started,
            old_runtime: None,
            new_runtime: None,
            snapshot: None,
            download: None,
            installer: None,
            migrated_packages: 0,
            failures: Vec::new(),
            advisories: Vec::new(),
            abort: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Why the session aborted, if it did.
    pub fn abort_reason(&self) -> Option<&StepFailure> {
        self.abort.as_ref()
    }

    /// Move to `to`, enforcing forward-only order.
    pub fn transition(&mut self, to: SessionStatus) -> Result<()> {
        let invalid = || KamekError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        };

        if self.status.is_terminal() {
            return Err(invalid());
        }
        if to != SessionStatus::Aborted && to.rank() <= self.status.rank() {
            return Err(invalid());
        }
        if to == SessionStatus::Migrating && !self.migration_ready() {
            return Err(invalid());
        }

        tracing::debug!("Upgrade session: {} -> {}", self.status, to);
        self.status = to;
        Ok(())
    }

    /// Whether a snapshot and a distinct confirmed runtime are both present.
    pub fn migration_ready(&self) -> bool {
        match (&self.snapshot, &self.new_runtime) {
            (Some(snapshot), Some(new)) => !same_path(
                &snapshot.source_runtime.executable_path,
                &new.executable_path,
                self.platform,
            ),
            _ => false,
        }
    }

    /// Enter `Migrating` and hand over the snapshot, which is consumed.
    pub fn begin_migration(&mut self) -> Result<MigrationSnapshot> {
        self.transition(SessionStatus::Migrating)?;
        self.snapshot.take().ok_or_else(|| KamekError::InvalidTransition {
            from: SessionStatus::Migrating.to_string(),
            to: "migration without snapshot".to_string(),
        })
    }

    /// Record a sub-step failure without ending the session.
    pub fn record_failure(&mut self, failure: StepFailure) {
        tracing::warn!("{} failed: {}", failure.step, failure.message);
        self.failures.push(failure);
    }

    /// Jump to `Aborted` with a reason. No-op on terminal sessions.
    pub fn abort(&mut self, failure: StepFailure) {
        if self.status.is_terminal() {
            return;
        }
        tracing::debug!("Upgrade aborted at {}: {}", self.status, failure.message);
        self.status = SessionStatus::Aborted;
        self.abort = Some(failure);
    }

    /// Terminal report with one concrete next action.
    pub fn report(&self, next_action: Option<String>) -> UpgradeReport {
        UpgradeReport {
            status: self.status,
            old_runtime: self.old_runtime.clone(),
            new_runtime: self.new_runtime.clone(),
            download: self.download.clone(),
            installer: self.installer.clone(),
            migrated_packages: self.migrated_packages,
            failures: self.failures.clone(),
            advisories: self.advisories.clone(),
            abort_reason: self.abort.clone(),
            next_action,
        }
    }
}

/// What an upgrade run did, for display or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub status: SessionStatus,
    pub old_runtime: Option<RuntimeDescriptor>,
    pub new_runtime: Option<RuntimeDescriptor>,
    pub download: Option<DownloadTarget>,
    pub installer: Option<FetchedFile>,
    pub migrated_packages: usize,
    pub failures: Vec<StepFailure>,
    pub advisories: Vec<Advisory>,
    pub abort_reason: Option<StepFailure>,
    pub next_action: Option<String>,
}

impl UpgradeReport {
    /// Whether the run reached its last step without a blocking failure.
    pub fn is_success(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}
