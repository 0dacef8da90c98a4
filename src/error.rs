//! Error types for Kamek operations.
//!
//! This module defines [`KamekError`], the primary error type used throughout
//! the application, the [`ErrorKind`] taxonomy that terminal reports carry,
//! and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Detection problems are values ([`crate::toolchain::DetectError`]) that
//!   callers branch on; they convert into `KamekError` only at the CLI edge
//! - Orchestration problems are captured into the upgrade report
//! - Use `anyhow::Error` (via `KamekError::Other`) for unexpected errors
//! - All errors should provide an actionable message for users

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The seven outcome kinds a provisioning run can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unresolved,
    VersionTooOld,
    IncompatibleMajorVersion,
    PrivilegeRequired,
    ExternalFailure,
    UserAborted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Unresolved => "unresolved",
            ErrorKind::VersionTooOld => "version too old",
            ErrorKind::IncompatibleMajorVersion => "incompatible major version",
            ErrorKind::PrivilegeRequired => "privilege required",
            ErrorKind::ExternalFailure => "external failure",
            ErrorKind::UserAborted => "aborted by user",
        };
        f.write_str(name)
    }
}

/// Core error type for Kamek operations.
#[derive(Debug, Error)]
pub enum KamekError {
    /// A toolchain component could not be located or probed.
    #[error("{what} not found: {message}")]
    NotFound { what: String, message: String },

    /// A recorded path could not be mapped onto this platform.
    #[error("Could not resolve '{raw}' to an existing path")]
    Unresolved { raw: String },

    /// The located toolchain is older than required.
    #[error("Version {found} is older than the required {required}")]
    VersionTooOld { found: String, required: String },

    /// The located interpreter belongs to an incompatible major line.
    #[error("Version {found} belongs to an unsupported major release line")]
    IncompatibleMajorVersion { found: String },

    /// The operation needs elevated privileges that the process does not hold.
    #[error("Administrator privileges required: {action}")]
    PrivilegeRequired { action: String },

    /// An external program or service failed.
    #[error("{step} failed: {message}")]
    ExternalFailure { step: String, message: String },

    /// The user declined to continue.
    #[error("Aborted: {reason}")]
    UserAborted { reason: String },

    /// Configuration file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// An upgrade session was asked to move backwards or out of a terminal state.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KamekError {
    /// Map this error onto the reporting taxonomy.
    ///
    /// Errors outside the taxonomy (IO, config, internal) are downgraded to
    /// [`ErrorKind::ExternalFailure`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            KamekError::NotFound { .. } => ErrorKind::NotFound,
            KamekError::Unresolved { .. } => ErrorKind::Unresolved,
            KamekError::VersionTooOld { .. } => ErrorKind::VersionTooOld,
            KamekError::IncompatibleMajorVersion { .. } => ErrorKind::IncompatibleMajorVersion,
            KamekError::PrivilegeRequired { .. } => ErrorKind::PrivilegeRequired,
            KamekError::UserAborted { .. } => ErrorKind::UserAborted,
            KamekError::ExternalFailure { .. }
            | KamekError::ConfigNotFound { .. }
            | KamekError::ConfigParseError { .. }
            | KamekError::InvalidTransition { .. }
            | KamekError::Io(_)
            | KamekError::Other(_) => ErrorKind::ExternalFailure,
        }
    }

    pub(crate) fn external(step: impl Into<String>, message: impl Into<String>) -> Self {
        KamekError::ExternalFailure {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Kamek operations.
pub type Result<T> = std::result::Result<T, KamekError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_what_and_message() {
        let err = KamekError::NotFound {
            what: "Python".into(),
            message: "no interpreter on PATH".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Python"));
        assert!(msg.contains("no interpreter on PATH"));
    }

    #[test]
    fn unresolved_displays_raw_value() {
        let err = KamekError::Unresolved {
            raw: "/opt/devkitpro".into(),
        };
        assert!(err.to_string().contains("/opt/devkitpro"));
    }

    #[test]
    fn version_too_old_displays_both_versions() {
        let err = KamekError::VersionTooOld {
            found: "3.6.9".into(),
            required: "3.8".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3.6.9"));
        assert!(msg.contains("3.8"));
    }

    #[test]
    fn privilege_required_displays_action() {
        let err = KamekError::PrivilegeRequired {
            action: "set DEVKITPRO system-wide".into(),
        };
        assert!(err.to_string().contains("DEVKITPRO"));
    }

    #[test]
    fn kind_maps_taxonomy_variants() {
        let err = KamekError::UserAborted {
            reason: "declined".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UserAborted);

        let err = KamekError::IncompatibleMajorVersion {
            found: "2.7.18".into(),
        };
        assert_eq!(err.kind(), ErrorKind::IncompatibleMajorVersion);
    }

    #[test]
    fn kind_downgrades_io_to_external_failure() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: KamekError = io_err.into();
        assert_eq!(err.kind(), ErrorKind::ExternalFailure);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::IncompatibleMajorVersion).unwrap();
        assert_eq!(json, "\"incompatible_major_version\"");
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(KamekError::external("download", "connection reset"))
        }
        assert!(returns_error().is_err());
    }
}
