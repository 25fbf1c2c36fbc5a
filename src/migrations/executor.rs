//! Migration execution.
//!
//! [`apply`] runs pending steps against a working copy of the document and
//! commits only when every step succeeded. The caller's document is handed
//! back untouched on failure, so a run is all-or-nothing per document.
//!
//! Steps run strictly one after another in ascending id order. Each
//! transform is only defined on the shape its predecessors leave behind,
//! so there is no parallelism inside a document. Independent documents can
//! be migrated concurrently; the registry is the only shared state and it
//! is read-only.

use std::time::Instant;

use tracing::{debug, debug_span, warn};

use super::document::Document;
use super::registry::MigrationRegistry;
use super::resolver::{classify, VersionStatus};
use super::step::MigrationStep;
use crate::errors::MigrationError;
use crate::observability::set_current_step;

/// A failed run: the caller's original document and what went wrong.
#[derive(Debug, Clone)]
pub struct FailedMigration {
    /// The document exactly as it was handed in.
    pub document: Document,
    pub error: MigrationError,
}

impl std::fmt::Display for FailedMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for FailedMigration {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Apply `pending` to `document`, in order.
///
/// On success the returned document carries `lastMigration` equal to the
/// last applied id. On the first failing step the run stops, the partially
/// migrated working copy is discarded and the original document comes back
/// inside [`FailedMigration`] together with the failing step's id.
///
/// An empty `pending` list returns the document as is.
pub fn apply(document: Document, pending: &[MigrationStep]) -> Result<Document, FailedMigration> {
    if pending.is_empty() {
        return Ok(document);
    }

    if let Err(error) = check_ascending(pending) {
        return Err(FailedMigration { document, error });
    }

    let mut working = document.clone();

    for step in pending {
        let _span = debug_span!("migration_step", id = step.id()).entered();
        let _step_guard = set_current_step(step.id());
        let started = Instant::now();

        if let Err(cause) = step.run(working.as_value_mut()) {
            warn!(step = step.id(), error = %cause, "migration step failed, discarding working copy");
            return Err(FailedMigration {
                document,
                error: MigrationError::step_failed(step.id(), cause),
            });
        }

        // Stamp right after the step so the stamp never runs ahead of the
        // work actually done.
        working.set_last_migration(step.id());
        debug!(
            step = step.id(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "applied {}",
            step.description()
        );
    }

    Ok(working)
}

fn check_ascending(pending: &[MigrationStep]) -> Result<(), MigrationError> {
    pending.windows(2).try_for_each(|pair| {
        if pair[1].id() > pair[0].id() {
            Ok(())
        } else {
            Err(MigrationError::UnorderedSteps {
                id: pair[1].id(),
                previous: pair[0].id(),
            })
        }
    })
}

/// Outcome of [`migrate`] for a document that could be processed.
#[derive(Debug, Clone)]
pub enum MigrationOutcome {
    /// Nothing pending; the document is returned unchanged.
    UpToDate { document: Document },
    /// Steps were applied.
    Migrated {
        document: Document,
        from: u64,
        to: u32,
        applied: Vec<u32>,
    },
    /// Written by a newer release. The document is returned unchanged and
    /// must not be re-saved under the current version.
    FutureVersion {
        document: Document,
        version: u64,
        current: u32,
    },
}

impl MigrationOutcome {
    pub fn document(&self) -> &Document {
        match self {
            Self::UpToDate { document }
            | Self::Migrated { document, .. }
            | Self::FutureVersion { document, .. } => document,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Self::UpToDate { document }
            | Self::Migrated { document, .. }
            | Self::FutureVersion { document, .. } => document,
        }
    }

    pub fn status(&self) -> VersionStatus {
        match self {
            Self::UpToDate { .. } => VersionStatus::UpToDate,
            Self::Migrated { .. } => VersionStatus::PendingUpgrade,
            Self::FutureVersion { .. } => VersionStatus::FutureVersion,
        }
    }
}

/// Classify and, when needed, apply pending steps.
///
/// # Example
///
/// ```rust
/// use envmigrate::migrations::{builtin_registry, migrate, Document, MigrationOutcome};
/// use serde_json::json;
///
/// let registry = builtin_registry().unwrap();
/// let legacy = Document::new(json!({ "name": "Demo", "routes": [] }));
///
/// match migrate(legacy, registry).unwrap() {
///     MigrationOutcome::Migrated { to, .. } => assert_eq!(to, registry.current_version()),
///     other => panic!("unexpected outcome: {:?}", other),
/// }
/// ```
pub fn migrate(
    document: Document,
    registry: &MigrationRegistry,
) -> Result<MigrationOutcome, FailedMigration> {
    let classification = match classify(&document, registry) {
        Ok(classification) => classification,
        Err(error) => return Err(FailedMigration { document, error }),
    };

    match classification.status {
        VersionStatus::UpToDate => Ok(MigrationOutcome::UpToDate { document }),
        VersionStatus::FutureVersion => Ok(MigrationOutcome::FutureVersion {
            document,
            version: classification.version,
            current: classification.current,
        }),
        VersionStatus::PendingUpgrade => {
            let applied = classification.pending_ids();
            let migrated = apply(document, classification.pending)?;
            Ok(MigrationOutcome::Migrated {
                document: migrated,
                from: classification.version,
                to: classification.current,
                applied,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransformError;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn add_headers(doc: &mut Value) -> Result<(), TransformError> {
        doc["headers"] = json!([]);
        Ok(())
    }

    fn add_cors(doc: &mut Value) -> Result<(), TransformError> {
        doc["cors"] = json!(true);
        Ok(())
    }

    fn fail(_: &mut Value) -> Result<(), TransformError> {
        Err(TransformError::new("unsupported shape"))
    }

    fn clobber_stamp(doc: &mut Value) -> Result<(), TransformError> {
        doc["lastMigration"] = json!(1000);
        Ok(())
    }

    #[test]
    fn test_single_step_adds_headers() {
        let registry =
            MigrationRegistry::new(vec![MigrationStep::new(1, "headers", add_headers)]).unwrap();
        let doc = Document::new(json!({ "lastMigration": 0, "routes": [] }));

        let migrated = apply(doc, registry.pending_after(0)).unwrap();

        assert_eq!(
            migrated.into_value(),
            json!({ "lastMigration": 1, "routes": [], "headers": [] })
        );
    }

    #[test]
    fn test_up_to_date_document_is_unchanged() {
        let registry =
            MigrationRegistry::new(vec![MigrationStep::new(1, "headers", add_headers)]).unwrap();
        let doc = Document::new(json!({ "lastMigration": 1 }));

        let outcome = migrate(doc.clone(), &registry).unwrap();

        assert_eq!(outcome.status(), VersionStatus::UpToDate);
        assert_eq!(outcome.into_document(), doc);
    }

    #[test]
    fn test_failure_returns_original_document() {
        let registry = MigrationRegistry::new(vec![
            MigrationStep::new(1, "headers", add_headers),
            MigrationStep::new(2, "cors", add_cors),
            MigrationStep::new(3, "fail", fail),
        ])
        .unwrap();
        let original = Document::new(json!({ "lastMigration": 0, "name": "env" }));

        let failed = apply(original.clone(), registry.pending_after(0)).unwrap_err();

        assert_eq!(failed.document, original);
        assert_eq!(failed.error.failing_step(), Some(3));
        assert!(failed.to_string().contains("unsupported shape"));
    }

    #[test]
    fn test_rejects_unordered_steps_before_running_any() {
        let steps = [
            MigrationStep::new(2, "cors", add_cors),
            MigrationStep::new(1, "headers", add_headers),
        ];
        let original = Document::new(json!({}));

        let failed = apply(original.clone(), &steps).unwrap_err();

        assert_eq!(failed.document, original);
        assert_eq!(
            failed.error,
            MigrationError::UnorderedSteps { id: 1, previous: 2 }
        );
    }

    #[test]
    fn test_executor_owns_the_stamp() {
        let registry = MigrationRegistry::new(vec![
            MigrationStep::new(1, "clobber", clobber_stamp),
            MigrationStep::new(2, "cors", add_cors),
        ])
        .unwrap();

        let migrated = apply(Document::new(json!({})), registry.pending_after(0)).unwrap();
        assert_eq!(migrated.last_migration().unwrap(), Some(2));
    }

    #[test]
    fn test_migrate_reports_applied_steps() {
        let registry = MigrationRegistry::new(vec![
            MigrationStep::new(1, "headers", add_headers),
            MigrationStep::new(2, "cors", add_cors),
        ])
        .unwrap();

        let outcome = migrate(Document::new(json!({ "lastMigration": 1 })), &registry).unwrap();

        assert_eq!(outcome.status(), VersionStatus::PendingUpgrade);
        assert!(matches!(
            &outcome,
            MigrationOutcome::Migrated { from: 1, to: 2, applied, .. } if applied == &vec![2]
        ));
        assert_eq!(outcome.document().as_value()["cors"], json!(true));
        assert!(outcome.document().as_value().get("headers").is_none());
    }

    #[test]
    fn test_migrate_future_version_runs_nothing() {
        let registry = MigrationRegistry::new(vec![MigrationStep::new(1, "fail", fail)]).unwrap();
        let doc = Document::new(json!({ "lastMigration": 7 }));

        let outcome = migrate(doc.clone(), &registry).unwrap();

        match outcome {
            MigrationOutcome::FutureVersion {
                document,
                version,
                current,
            } => {
                assert_eq!(document, doc);
                assert_eq!(version, 7);
                assert_eq!(current, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_migrate_malformed_stamp_returns_document() {
        let registry =
            MigrationRegistry::new(vec![MigrationStep::new(1, "headers", add_headers)]).unwrap();
        let doc = Document::new(json!({ "lastMigration": 1.5 }));

        let failed = migrate(doc.clone(), &registry).unwrap_err();
        assert_eq!(failed.document, doc);
        assert!(matches!(
            failed.error,
            MigrationError::MalformedVersionStamp { .. }
        ));
    }
}
