//! Error types for registry and graph construction

use thiserror::Error;

/// Result type for schema and instance operations
pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

/// Errors raised while building or querying the schema registry and
/// schema graph. All of these are fatal to the build that raised them:
/// a registry is returned fully validated or not at all.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid schema attribute for {type_name}{}: {reason}", field_suffix(.field))]
    Validation {
        type_name: String,
        field: Option<String>,
        reason: String,
    },

    #[error("field '{field}' of {type_name} declares reference target '{target}' which is not a registered type")]
    Integrity {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("type '{type_name}' is already registered")]
    DuplicateType { type_name: String },

    #[error("no object schema registered for '{type_name}'")]
    NotFound { type_name: String },

    #[error("{type_name} has no field '{field}'; available fields: {available}")]
    FieldNotFound {
        type_name: String,
        field: String,
        available: String,
    },
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(f) => format!(", field '{f}'"),
        None => String::new(),
    }
}

impl SchemaError {
    /// Attribute-level validation failure on a type header
    pub fn validation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Validation {
            type_name: type_name.into(),
            field: None,
            reason: reason.into(),
        }
    }

    /// Attribute-level validation failure on a named field
    pub fn field_validation(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Validation {
            type_name: type_name.into(),
            field: Some(field.into()),
            reason: reason.into(),
        }
    }
}

/// Errors raised while extracting instance nodes or building the
/// instance graph. Name collisions and ambiguous references are not
/// errors (they degrade to diagnostics); these signal that the
/// upstream model-file parser produced something it never should.
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("field '{field}' of {type_name} '{name}' has unsupported value {value}; expected string, integer, or float")]
    UnsupportedValue {
        type_name: String,
        name: String,
        field: String,
        value: serde_json::Value,
    },

    #[error("name index holds {index_count} entries for {node_count} nodes; duplicate (type, name) pairs must be resolved:\n{collisions}")]
    InconsistentIndex {
        node_count: usize,
        index_count: usize,
        collisions: String,
    },
}
