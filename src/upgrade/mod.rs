//! Interpreter upgrade with package migration.
//!
//! The [`UpgradeOrchestrator`] owns one [`UpgradeSession`] per run and moves
//! it through detection, snapshot, download, new-path confirmation, and
//! migration. Steps that depend on the user running an installer are
//! blocking confirmations whose answers are re-verified, never trusted.

pub mod decision;
pub mod orchestrator;
pub mod session;
pub mod snapshot;

pub use decision::{validate_new_path, PathDecision, SKIP_KEYWORD};
pub use orchestrator::{
    UpgradeOrchestrator, UpgradeSettings, CONTINUE_WITHOUT_MIGRATION_KEY,
    NEW_INTERPRETER_PATH_KEY,
};
pub use session::{
    MigrationSnapshot, SessionStatus, StepFailure, UpgradeReport, UpgradeSession,
};
pub use snapshot::{parse_package_listing, Manifest};
