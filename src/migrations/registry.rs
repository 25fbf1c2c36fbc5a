//! Ordered, immutable catalogue of migration steps.
//!
//! The registry is built once and never mutated. Construction checks that
//! step ids are positive, unique and strictly increasing; the largest id is
//! the "current version" the running application understands.
//!
//! The application's catalogue lives behind [`builtin_registry`], which is
//! initialized on first use and shared read-only for the rest of the
//! process, including across rayon worker threads.

use once_cell::sync::OnceCell;

use super::builtin;
use super::step::MigrationStep;
use crate::errors::RegistryIntegrityViolation;

static BUILTIN: OnceCell<MigrationRegistry> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    /// Build a registry, rejecting zero, duplicate or out-of-order ids.
    ///
    /// # Example
    ///
    /// ```rust
    /// use envmigrate::migrations::{MigrationRegistry, MigrationStep};
    ///
    /// fn noop(_: &mut serde_json::Value) -> Result<(), envmigrate::errors::TransformError> {
    ///     Ok(())
    /// }
    ///
    /// let err = MigrationRegistry::new(vec![
    ///     MigrationStep::new(1, "first", noop),
    ///     MigrationStep::new(1, "again", noop),
    ///     MigrationStep::new(2, "second", noop),
    /// ]);
    /// assert!(err.is_err());
    /// ```
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, RegistryIntegrityViolation> {
        check_integrity(&steps)?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Highest step id, or 0 for an empty registry.
    pub fn current_version(&self) -> u32 {
        self.steps.last().map_or(0, MigrationStep::id)
    }

    /// Steps with `id > version`, in ascending order.
    pub fn pending_after(&self, version: u64) -> &[MigrationStep] {
        let start = self
            .steps
            .partition_point(|step| u64::from(step.id()) <= version);
        &self.steps[start..]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn check_integrity(steps: &[MigrationStep]) -> Result<(), RegistryIntegrityViolation> {
    let mut previous: Option<u32> = None;

    for (position, step) in steps.iter().enumerate() {
        let id = step.id();
        if id == 0 {
            return Err(RegistryIntegrityViolation::ZeroId { position });
        }
        match previous {
            Some(prev) if id == prev => {
                return Err(RegistryIntegrityViolation::DuplicateId { id, position });
            }
            Some(prev) if id < prev => {
                return Err(RegistryIntegrityViolation::NonMonotonic {
                    id,
                    previous: prev,
                    position,
                });
            }
            _ => {}
        }
        previous = Some(id);
    }

    Ok(())
}

/// The application's registry of environment migrations.
///
/// Call this at startup so an integrity violation stops the process before
/// any document is touched.
pub fn builtin_registry() -> Result<&'static MigrationRegistry, RegistryIntegrityViolation> {
    BUILTIN.get_or_try_init(|| MigrationRegistry::new(builtin::steps()))
}
