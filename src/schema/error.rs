// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Errors raised while building a [`Schema`](super::Schema) from its description.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A type declares a child type that is not part of the description.
    #[error("Couldn't find child '{child}' of type '{parent}'")]
    UnknownChild { parent: String, child: String },

    /// Type names must be usable in pattern strings.
    #[error("Invalid type name '{0}': must consist of lower-case letters, digits and underscores")]
    InvalidTypeName(String),

    #[error("Type '{0}' has no ID fields")]
    NoIdFields(String),

    #[error("ID field '{field}' of type '{type_name}' is not a declared field")]
    UnknownIdField { type_name: String, field: String },

    #[error("ID field '{field}' of type '{type_name}' is listed more than once")]
    DuplicateIdField { type_name: String, field: String },

    #[error("Required field '{field}' of type '{type_name}' is not a declared field")]
    UnknownRequiredField { type_name: String, field: String },

    /// The number of reference fields differs from the parent's ID field count.
    #[error("Relation '{parent}' -> '{child}' has {actual} reference field(s), expected {expected}")]
    RefFieldCount {
        parent: String,
        child: String,
        expected: usize,
        actual: usize,
    },

    #[error("Reference field '{field}' of relation '{parent}' -> '{child}' is not a field of '{child}'")]
    UnknownRefField {
        parent: String,
        child: String,
        field: String,
    },

    /// A field schema (or the composed schema) was rejected by the JSON Schema compiler.
    #[error("Invalid JSON schema for '{name}': {message}")]
    InvalidJsonSchema { name: String, message: String },

    #[error("Relation '{parent}' -> '{child}' does not reference type '{type_name}'")]
    NotAnEndpoint {
        type_name: String,
        parent: String,
        child: String,
    },

    #[error("Relation '{parent}' -> '{child}' is already registered on type '{type_name}'")]
    DuplicateRelation {
        type_name: String,
        parent: String,
        child: String,
    },

    /// The schema description could not be read or deserialized.
    #[error("Failed to load schema description {path}: {message}")]
    Load { path: String, message: String },
}

impl From<serde_json::Error> for SchemaError {
    fn from(error: serde_json::Error) -> Self {
        SchemaError::Load {
            path: "<json>".to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for SchemaError {
    fn from(error: serde_yaml::Error) -> Self {
        SchemaError::Load {
            path: "<yaml>".to_string(),
            message: error.to_string(),
        }
    }
}

/// Errors raised when object data does not conform to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The message reported by the JSON Schema validator, unchanged.
    #[error("Invalid {name} data: {message}")]
    Invalid { name: String, message: String },

    #[error("Object of type '{type_name}' is missing ID field '{field}'")]
    MissingIdField { type_name: String, field: String },

    #[error("ID field '{field}' of type '{type_name}' must be a string or null, got {value}")]
    InvalidIdValue {
        type_name: String,
        field: String,
        value: String,
    },
}
