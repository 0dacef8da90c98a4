//! Detection outcome types.
//!
//! Detection never raises: every failure is a [`DetectError`] value that the
//! caller branches on, and every non-blocking observation is an
//! [`Advisory`] carried alongside a successful result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorKind, KamekError};

use super::version::VersionTuple;

/// Why a toolchain component was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    /// Nothing runnable, or nothing that reported a version.
    #[error("{target}: {reason}")]
    NotFound { target: String, reason: String },

    /// A recorded location does not map to anything on this machine.
    #[error("'{raw}' does not resolve to an existing path")]
    Unresolved { raw: String },

    /// Found, but older than required.
    #[error("found {found}, need {required} or newer")]
    VersionTooOld {
        found: VersionTuple,
        required: VersionTuple,
    },

    /// Found, but on a major line that is never acceptable.
    #[error("found {found}, which is a Python 2 interpreter")]
    IncompatibleMajorVersion { found: VersionTuple },
}

impl DetectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectError::NotFound { .. } => ErrorKind::NotFound,
            DetectError::Unresolved { .. } => ErrorKind::Unresolved,
            DetectError::VersionTooOld { .. } => ErrorKind::VersionTooOld,
            DetectError::IncompatibleMajorVersion { .. } => ErrorKind::IncompatibleMajorVersion,
        }
    }
}

impl From<DetectError> for KamekError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::NotFound { target, reason } => KamekError::NotFound {
                what: target,
                message: reason,
            },
            DetectError::Unresolved { raw } => KamekError::Unresolved { raw },
            DetectError::VersionTooOld { found, required } => KamekError::VersionTooOld {
                found: found.to_string(),
                required: required.to_string(),
            },
            DetectError::IncompatibleMajorVersion { found } => {
                KamekError::IncompatibleMajorVersion {
                    found: found.to_string(),
                }
            }
        }
    }
}

/// A non-fatal observation made during detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Short machine-readable tag (e.g. `ambiguous_command`).
    pub code: String,
    /// Human-readable explanation with a suggested action.
    pub message: String,
}

impl Advisory {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
