//! Versioned migration engine.
//!
//! Control flow for one document:
//!
//! 1. [`classify`] reads `lastMigration` and picks the pending steps from the
//!    [`MigrationRegistry`].
//! 2. [`apply`] runs them in ascending order on a working copy, stamping the
//!    copy after every step.
//! 3. The migrated copy is returned, or the untouched original together with
//!    the failing step on error.
//!
//! [`migrate`] chains both for callers that do not need to look at the
//! classification first.

pub mod builtin;
pub mod document;
pub mod executor;
pub mod registry;
pub mod resolver;
pub mod step;

pub use document::{Document, LAST_MIGRATION_KEY, UNSTAMPED_VERSION};
pub use executor::{apply, migrate, FailedMigration, MigrationOutcome};
pub use registry::{builtin_registry, MigrationRegistry};
pub use resolver::{classify, Classification, VersionStatus};
pub use step::{MigrationStep, Transform};
