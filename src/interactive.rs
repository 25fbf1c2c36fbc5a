//! Interactive load path.
//!
//! When an application opens an environment it runs the same engine as the
//! batch tool, then turns the outcome into one of two user-visible message
//! codes or silent success. A document that could not be migrated, or that
//! came from a newer release, is still handed back for inspection, but is
//! marked as not saveable.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::MigrationError;
use crate::migrations::{builtin_registry, migrate, Document, MigrationOutcome, MigrationRegistry, VersionStatus};

/// Severity attached to a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Error,
}

/// User-facing message raised while opening an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    /// The executor aborted, or the version stamp could not be read.
    EnvironmentMigrationFailed,
    /// The document was saved by a more recent release.
    EnvironmentMoreRecentVersion,
}

impl MessageCode {
    pub fn level(self) -> MessageLevel {
        MessageLevel::Error
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnvironmentMigrationFailed => "ENVIRONMENT_MIGRATION_FAILED",
            Self::EnvironmentMoreRecentVersion => "ENVIRONMENT_MORE_RECENT_VERSION",
        }
    }
}

impl std::fmt::Display for MessageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An environment as handed to the application after load.
#[derive(Debug, Clone)]
pub struct OpenedEnvironment {
    /// Migrated document, or the original when migration did not happen.
    pub document: Document,
    /// `None` when the stamp itself could not be read.
    pub status: Option<VersionStatus>,
    pub message: Option<MessageCode>,
    pub saveable: bool,
    error: Option<MigrationError>,
}

impl OpenedEnvironment {
    /// The error behind `message`, if any.
    pub fn error(&self) -> Option<&MigrationError> {
        self.error.as_ref()
    }

    /// Refuse a save that would stamp the document with a version it was
    /// not migrated to.
    pub fn ensure_saveable(&self) -> Result<(), MigrationError> {
        match &self.error {
            Some(error) if !self.saveable => Err(error.clone()),
            _ => Ok(()),
        }
    }

    fn ready(document: Document, status: VersionStatus) -> Self {
        Self {
            document,
            status: Some(status),
            message: None,
            saveable: true,
            error: None,
        }
    }

    fn blocked(
        document: Document,
        status: Option<VersionStatus>,
        message: MessageCode,
        error: MigrationError,
    ) -> Self {
        Self {
            document,
            status,
            message: Some(message),
            saveable: false,
            error: Some(error),
        }
    }
}

/// Open a raw environment against the built-in registry.
pub fn open_environment(raw: Value) -> OpenedEnvironment {
    match builtin_registry() {
        Ok(registry) => open_environment_with(raw, registry),
        Err(violation) => OpenedEnvironment::blocked(
            Document::new(raw),
            None,
            MessageCode::EnvironmentMigrationFailed,
            violation.into(),
        ),
    }
}

/// Open a raw environment against an explicit registry.
pub fn open_environment_with(raw: Value, registry: &MigrationRegistry) -> OpenedEnvironment {
    match migrate(Document::new(raw), registry) {
        Ok(MigrationOutcome::UpToDate { document }) => {
            OpenedEnvironment::ready(document, VersionStatus::UpToDate)
        }
        Ok(MigrationOutcome::Migrated {
            document, from, to, ..
        }) => {
            info!(from, to, "Environment migrated on open");
            OpenedEnvironment::ready(document, VersionStatus::PendingUpgrade)
        }
        Ok(MigrationOutcome::FutureVersion {
            document,
            version,
            current,
        }) => {
            warn!(version, current, "Environment saved by a more recent release");
            OpenedEnvironment::blocked(
                document,
                Some(VersionStatus::FutureVersion),
                MessageCode::EnvironmentMoreRecentVersion,
                MigrationError::future_version(version, current),
            )
        }
        Err(failed) => {
            warn!(error = %failed.error, "Environment migration failed on open");
            let status = match &failed.error {
                MigrationError::MalformedVersionStamp { .. } => None,
                _ => Some(VersionStatus::PendingUpgrade),
            };
            OpenedEnvironment::blocked(
                failed.document,
                status,
                MessageCode::EnvironmentMigrationFailed,
                failed.error,
            )
        }
    }
}
