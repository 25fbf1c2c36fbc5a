//! Versioned migrations for mock API environment documents.
//!
//! An environment is a JSON document stamped with `lastMigration`, the id
//! of the last schema migration applied to it. Opening an environment
//! written by an older release runs every later migration, in order, on a
//! working copy; the caller gets either the fully migrated document or the
//! untouched original with the id of the step that failed.
//!
//! ```rust
//! use envmigrate::{builtin_registry, migrate, Document, MigrationOutcome};
//! use serde_json::json;
//!
//! let registry = builtin_registry().unwrap();
//! let outcome = migrate(Document::new(json!({ "routes": [] })), registry).unwrap();
//! assert!(matches!(outcome, MigrationOutcome::Migrated { from: 0, .. }));
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod interactive;
pub mod io;
pub mod migrations;
pub mod observability;
pub mod progress;

pub use crate::errors::{BatchError, ErrorCode, MigrationError, RegistryIntegrityViolation, TransformError};

pub use crate::migrations::{
    apply, builtin_registry, classify, migrate, Classification, Document, FailedMigration,
    MigrationOutcome, MigrationRegistry, MigrationStep, VersionStatus,
};

pub use crate::interactive::{open_environment, MessageCode, OpenedEnvironment};

pub use crate::batch::{migrate_files, BatchOptions, BatchReport, FileOutcome};

pub use crate::config::EnvMigrateConfig;
