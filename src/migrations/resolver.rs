//! Version resolution: which steps does a document still need?
//!
//! [`classify`] reads the document's stamp and compares it with the
//! registry's current version. Three outcomes are possible and all three
//! are reported explicitly; a document from a newer release is never
//! folded into "nothing to do".

use serde::Serialize;

use super::document::Document;
use super::registry::MigrationRegistry;
use super::step::MigrationStep;
use crate::errors::MigrationError;

/// Where a document stands relative to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Stamp equals the current version.
    UpToDate,
    /// Stamp is below the current version; steps are pending.
    PendingUpgrade,
    /// Stamp is above the current version: written by a newer release.
    FutureVersion,
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpToDate => write!(f, "up to date"),
            Self::PendingUpgrade => write!(f, "pending upgrade"),
            Self::FutureVersion => write!(f, "more recent version"),
        }
    }
}

/// Result of classifying one document.
#[derive(Debug, Clone)]
pub struct Classification<'r> {
    /// Effective stamp (0 when the stamp was absent).
    pub version: u64,
    /// Whether the stamp was actually present.
    pub stamped: bool,
    /// Registry's current version at classification time.
    pub current: u32,
    pub status: VersionStatus,
    /// Steps with id above `version`, ascending. Empty unless
    /// `status == PendingUpgrade`.
    pub pending: &'r [MigrationStep],
}

impl Classification<'_> {
    pub fn pending_ids(&self) -> Vec<u32> {
        self.pending.iter().map(MigrationStep::id).collect()
    }
}

/// Classify a document against a registry.
///
/// A missing stamp is the bootstrap case and counts as version 0; a present
/// stamp that is not a non-negative integer is an error.
///
/// # Example
///
/// ```rust
/// use envmigrate::migrations::{builtin_registry, classify, Document, VersionStatus};
/// use serde_json::json;
///
/// let registry = builtin_registry().unwrap();
/// let doc = Document::new(json!({ "lastMigration": 9999 }));
/// let classification = classify(&doc, registry).unwrap();
/// assert_eq!(classification.status, VersionStatus::FutureVersion);
/// assert!(classification.pending.is_empty());
/// ```
pub fn classify<'r>(
    document: &Document,
    registry: &'r MigrationRegistry,
) -> Result<Classification<'r>, MigrationError> {
    let stamp = document.last_migration()?;
    let version = stamp.unwrap_or(super::document::UNSTAMPED_VERSION);
    let current = registry.current_version();

    let (status, pending) = match version.cmp(&u64::from(current)) {
        std::cmp::Ordering::Equal => (VersionStatus::UpToDate, &[][..]),
        std::cmp::Ordering::Less => (
            VersionStatus::PendingUpgrade,
            registry.pending_after(version),
        ),
        std::cmp::Ordering::Greater => (VersionStatus::FutureVersion, &[][..]),
    };

    Ok(Classification {
        version,
        stamped: stamp.is_some(),
        current,
        status,
        pending,
    })
}
