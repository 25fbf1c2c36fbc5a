//! Error taxonomy for the migration engine.
//!
//! Every engine failure is a [`MigrationError`]. Variants map onto the four
//! conditions the engine distinguishes:
//!
//! - `MalformedVersionStamp`: `lastMigration` is present but unusable
//! - `StepExecutionFailure`: a step's transform could not complete
//! - `FutureVersionDetected`: the document was written by a newer release
//! - `RegistryIntegrityViolation`: the step catalogue itself is broken
//!
//! # Error Codes
//!
//! Codes are assigned by category:
//! - M001-M009: document and version stamp errors
//! - M010-M019: step execution errors
//! - M020-M029: version compatibility errors
//! - M030-M039: registry errors
//!
//! # Example
//!
//! ```rust
//! use envmigrate::errors::{ErrorCode, MigrationError, TransformError};
//!
//! let err = MigrationError::step_failed(4, TransformError::new("routes is not an array"));
//! assert_eq!(err.code(), ErrorCode::STEP_EXECUTION);
//! assert_eq!(err.failing_step(), Some(4));
//! ```

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::migrations::document::json_kind;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// `lastMigration` is present but not a non-negative integer
    pub const MALFORMED_STAMP: ErrorCode = ErrorCode("M001");
    /// The document root is not an object
    pub const MALFORMED_DOCUMENT: ErrorCode = ErrorCode("M002");

    /// A step transform failed
    pub const STEP_EXECUTION: ErrorCode = ErrorCode("M010");
    /// Pending steps were handed to the executor out of order
    pub const STEP_ORDER: ErrorCode = ErrorCode("M011");

    /// Document was produced by a more recent release
    pub const FUTURE_VERSION: ErrorCode = ErrorCode("M020");

    /// Duplicate or non-monotonic step identifiers
    pub const REGISTRY_INTEGRITY: ErrorCode = ErrorCode("M030");

    /// Get the error code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure signalled by a single step's transform.
///
/// Transforms only know about the shape they expected; the executor wraps
/// this into [`MigrationError::StepExecutionFailure`] with the step id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
    /// JSON pointer to the offending value, when known.
    pointer: Option<String>,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pointer: None,
        }
    }

    /// Create an error anchored to a location in the document.
    pub fn at(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        let pointer = pointer.into();
        Self {
            message: format!("{}: {}", pointer, message.into()),
            pointer: Some(pointer),
        }
    }

    /// Error for a value whose JSON type differs from what the step handles.
    pub fn unexpected_type(pointer: impl Into<String>, expected: &str, found: &serde_json::Value) -> Self {
        Self::at(pointer, format!("expected {}, found {}", expected, json_kind(found)))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn pointer(&self) -> Option<&str> {
        self.pointer.as_deref()
    }
}

/// Step catalogue failed its construction-time check.
///
/// Fatal to process initialization; never recovered at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryIntegrityViolation {
    #[error("migration step id 0 is reserved for unstamped documents (position {position})")]
    ZeroId { position: usize },

    #[error("duplicate migration step id {id} at position {position}")]
    DuplicateId { id: u32, position: usize },

    #[error("migration step id {id} at position {position} does not follow {previous}")]
    NonMonotonic {
        id: u32,
        previous: u32,
        position: usize,
    },
}

/// Unified error type for migration operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    /// `lastMigration` present but not a non-negative integer, or the
    /// document root cannot carry a stamp at all.
    #[error("malformed version stamp: {reason}")]
    MalformedVersionStamp {
        reason: String,
        /// The offending stamp, rendered as JSON.
        found: Option<String>,
    },

    /// A step's transform could not complete against the document it received.
    #[error("migration {step_id} failed: {cause}")]
    StepExecutionFailure { step_id: u32, cause: TransformError },

    /// Document written by a newer release; re-saving it would claim a
    /// compatibility it does not have.
    #[error("document is at version {version}, newer than the supported version {current}")]
    FutureVersionDetected { version: u64, current: u32 },

    /// Pending list handed to the executor was not strictly ascending.
    #[error("migration {id} is scheduled after {previous}; steps must run in ascending order")]
    UnorderedSteps { id: u32, previous: u32 },

    #[error("migration registry integrity violation: {0}")]
    RegistryIntegrityViolation(#[from] RegistryIntegrityViolation),
}

impl MigrationError {
    // ==========================================================================
    // Constructor Methods
    // ==========================================================================

    /// Stamp present with an unusable value.
    #[must_use]
    pub fn malformed_stamp(found: &serde_json::Value) -> Self {
        Self::MalformedVersionStamp {
            reason: format!("lastMigration must be a non-negative integer, found {}", found),
            found: Some(found.to_string()),
        }
    }

    /// Root value cannot carry a stamp.
    #[must_use]
    pub fn not_an_object(kind: &str) -> Self {
        Self::MalformedVersionStamp {
            reason: format!("document root must be an object, found {}", kind),
            found: None,
        }
    }

    #[must_use]
    pub fn step_failed(step_id: u32, cause: TransformError) -> Self {
        Self::StepExecutionFailure { step_id, cause }
    }

    #[must_use]
    pub fn future_version(version: u64, current: u32) -> Self {
        Self::FutureVersionDetected { version, current }
    }

    // ==========================================================================
    // Accessor Methods
    // ==========================================================================

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedVersionStamp { found: Some(_), .. } => ErrorCode::MALFORMED_STAMP,
            Self::MalformedVersionStamp { found: None, .. } => ErrorCode::MALFORMED_DOCUMENT,
            Self::StepExecutionFailure { .. } => ErrorCode::STEP_EXECUTION,
            Self::UnorderedSteps { .. } => ErrorCode::STEP_ORDER,
            Self::FutureVersionDetected { .. } => ErrorCode::FUTURE_VERSION,
            Self::RegistryIntegrityViolation(_) => ErrorCode::REGISTRY_INTEGRITY,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedVersionStamp { .. } => "Document",
            Self::StepExecutionFailure { .. } | Self::UnorderedSteps { .. } => "Execution",
            Self::FutureVersionDetected { .. } => "Compatibility",
            Self::RegistryIntegrityViolation(_) => "Registry",
        }
    }

    /// Id of the step that failed, for execution failures.
    #[must_use]
    pub fn failing_step(&self) -> Option<u32> {
        match self {
            Self::StepExecutionFailure { step_id, .. } => Some(*step_id),
            _ => None,
        }
    }

    /// Check if this error is something the user can fix by editing the
    /// document (as opposed to upgrading the application or fixing a bug).
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::MalformedVersionStamp { .. } | Self::StepExecutionFailure { .. }
        )
    }
}

impl Serialize for MigrationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("MigrationError", 5)?;
        state.serialize_field("code", &self.code().as_str())?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("step", &self.failing_step())?;
        state.serialize_field("user_fixable", &self.is_user_fixable())?;
        state.end()
    }
}

/// Errors at the batch tool's file boundary.
///
/// Each variant is scoped to one file; the batch runner records it and
/// moves on to the next file.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Migration {
        path: PathBuf,
        #[source]
        source: MigrationError,
    },
}

impl BatchError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::Write { path, .. }
            | Self::Migration { path, .. } => path,
        }
    }
}
