//! In-memory environment document.
//!
//! A [`Document`] wraps an arbitrary JSON value. The engine only ever looks
//! at one field itself, [`LAST_MIGRATION_KEY`]; everything else is opaque
//! and belongs to the individual steps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MigrationError;

/// Name of the version stamp field.
pub const LAST_MIGRATION_KEY: &str = "lastMigration";

/// Version assumed for documents saved before the stamp existed.
pub const UNSTAMPED_VERSION: u64 = 0;

/// One environment configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Read the version stamp.
    ///
    /// Returns `Ok(None)` when the stamp is absent (legacy documents), the
    /// stamp when it is a non-negative integer, and an error otherwise. The
    /// value is never coerced: `"3"`, `3.0` and `-1` are all rejected.
    pub fn last_migration(&self) -> Result<Option<u64>, MigrationError> {
        let object = match &self.0 {
            Value::Object(object) => object,
            other => return Err(MigrationError::not_an_object(json_kind(other))),
        };

        match object.get(LAST_MIGRATION_KEY) {
            None => Ok(None),
            Some(stamp) => stamp
                .as_u64()
                .map(Some)
                .ok_or_else(|| MigrationError::malformed_stamp(stamp)),
        }
    }

    /// Stamp with [`UNSTAMPED_VERSION`] as the default for missing stamps.
    pub fn effective_version(&self) -> Result<u64, MigrationError> {
        Ok(self.last_migration()?.unwrap_or(UNSTAMPED_VERSION))
    }

    /// Overwrite the version stamp. No-op on non-object roots, which never
    /// get past classification.
    pub(crate) fn set_last_migration(&mut self, version: u32) {
        if let Value::Object(object) = &mut self.0 {
            object.insert(LAST_MIGRATION_KEY.to_string(), Value::from(version));
        }
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.0
    }
}

/// Human name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
