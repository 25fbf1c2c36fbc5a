use serde_json::Value;

use crate::errors::TransformError;

/// Transformation run by a single step against the working copy.
pub type Transform = fn(&mut Value) -> Result<(), TransformError>;

/// A single identified, one-way schema transformation.
///
/// `id` is stable forever once published: renumbering or removing a step
/// breaks every document saved at or above it. The transform may assume
/// every lower-numbered step has already run and must not read or write
/// `lastMigration`.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    id: u32,
    description: &'static str,
    transform: Transform,
}

impl MigrationStep {
    pub const fn new(id: u32, description: &'static str, transform: Transform) -> Self {
        Self {
            id,
            description,
            transform,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub(crate) fn run(&self, document: &mut Value) -> Result<(), TransformError> {
        (self.transform)(document)
    }
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
