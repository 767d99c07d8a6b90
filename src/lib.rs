// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

pub mod pattern;
pub mod schema;
pub mod source;

pub use pattern::{error::PatternError, MatchSpec, ObjId, ObjIdList, Pattern, TypeExpr};
pub use schema::{
    error::{SchemaError, ValidationError},
    Relation, Schema, Type, TypeDef,
};
pub use source::Source;

#[cfg(feature = "arc")]
pub use schema::SCHEMA;

lazy_static::lazy_static! {
    static ref LIGHT_ASSERTS: bool = match std::env::var("KCIDB_LIGHT_ASSERTS") {
        Ok(v) => !v.is_empty() && v != "0",
        Err(_) => false,
    };
}

/// Returns true if expensive consistency checks (such as validating an object
/// before extracting its identity) should be skipped.
///
/// Controlled by the `KCIDB_LIGHT_ASSERTS` environment variable, read once.
pub fn light_asserts() -> bool {
    *LIGHT_ASSERTS
}
