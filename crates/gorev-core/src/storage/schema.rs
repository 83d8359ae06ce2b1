//! JSON Schema validation for persisted records.
//!
//! Every user or task read back from a [`Store`](super::Store) is checked
//! against the schema for its kind before it is deserialized. List blobs are
//! checked one element at a time so a single bad record cannot hide the
//! rest. Schemas live in `schema/` at the workspace root and are embedded at
//! compile time.

use std::sync::OnceLock;
use thiserror::Error;

const USER_SCHEMA_JSON: &str = include_str!("../../../../schema/user.schema.json");
const TASK_SCHEMA_JSON: &str = include_str!("../../../../schema/task.schema.json");

static USER_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static TASK_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

/// The shape a stored record is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Task,
}

impl RecordKind {
    fn source(self) -> (&'static OnceLock<Result<jsonschema::Validator, String>>, &'static str) {
        match self {
            RecordKind::User => (&USER_SCHEMA, USER_SCHEMA_JSON),
            RecordKind::Task => (&TASK_SCHEMA, TASK_SCHEMA_JSON),
        }
    }
}

fn get_validator(kind: RecordKind) -> Result<&'static jsonschema::Validator, SchemaError> {
    let (cell, raw) = kind.source();
    let result = cell.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options()
            .should_validate_formats(true)
            .build(&schema_value)
        {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate one record against the schema for `kind`.
///
/// Returns every violation found, formatted as `"<message> at <path>"`.
pub fn validate_record(kind: RecordKind, value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator(kind).map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
