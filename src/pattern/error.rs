// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use thiserror::Error;

/// Which kind of type lookup failed during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// A root type, looked up in the schema.
    Root,
    Child,
    Parent,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Root => write!(f, "type"),
            LookupKind::Child => write!(f, "child type"),
            LookupKind::Parent => write!(f, "parent type"),
        }
    }
}

/// Errors raised while building, parsing or formatting patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern string doesn't match the grammar at `pos`.
    #[error("Invalid pattern string '{string}' at position {pos}: '{rest}'")]
    Syntax {
        string: String,
        pos: usize,
        rest: String,
    },

    #[error("Cannot find {kind} '{name}'")]
    UnknownType { kind: LookupKind, name: String },

    #[error("Cannot traverse parents without a preceding pattern specification")]
    MissingParentBase,

    #[error("No ID list list specified to substitute the placeholder at position {pos}")]
    NoIdLists { pos: usize },

    #[error("Not enough ID lists specified to substitute the placeholder at position {pos}")]
    NotEnoughIdLists { pos: usize },

    #[error("Too many ID lists specified for pattern '{string}'")]
    TooManyIdLists { string: String },

    /// An ID doesn't have one value per ID field of the type.
    #[error("ID for type '{type_name}' has {actual} field(s), expected {expected}")]
    IdLength {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// A pattern was based on a pattern for a type it's not related to.
    #[error("Type '{type_name}' is not a {kind} of type '{base_type_name}'")]
    NotRelated {
        kind: LookupKind,
        type_name: String,
        base_type_name: String,
    },

    #[error("Pattern for type '{0}' without a base must be a child pattern")]
    RootParent(String),

    #[error("Invalid ID list '{text}' at position {pos}")]
    InvalidIdList { text: String, pos: usize },

    /// An object in I/O data lacks a string value for an ID field.
    #[error("Object #{index} in '{list}' has no string value for ID field '{field}'")]
    InvalidIoObject {
        list: String,
        index: usize,
        field: String,
    },

    #[error("ID field cannot be represented in a pattern string: {field:?}")]
    UnrepresentableIdField { field: Option<String> },

    #[error("Failed expanding pattern specification at position {pos}: '{rest}'")]
    Expansion {
        pos: usize,
        rest: String,
        #[source]
        source: Box<PatternError>,
    },
}
