// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composition of JSON schemas describing object data, and validation against them.

use crate::schema::error::{SchemaError, ValidationError};
use crate::schema::TypeDef;

use core::fmt;
use serde_json::{json, Map, Value};

/// Build the JSON schema of a single object of a type.
///
/// Every declared field must be present. Fields not listed as required may be
/// `null`. Undeclared fields are rejected.
pub fn instance_shape(def: &TypeDef) -> Value {
    let mut properties = Map::new();
    for (field, field_schema) in &def.field_json_schemas {
        let shape = if def.required_fields.contains(field) {
            field_schema.clone()
        } else {
            json!({ "anyOf": [{ "type": "null" }, field_schema] })
        };
        properties.insert(field.clone(), shape);
    }
    let required: Vec<&String> = def.field_json_schemas.keys().collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Build the JSON schema of a complete object collection: a map of type
/// names to arrays of objects of that type.
pub fn composed_shape<'a, I>(instance_shapes: I) -> Value
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let properties: Map<String, Value> = instance_shapes
        .into_iter()
        .map(|(name, shape)| (name.clone(), json!({ "type": "array", "items": shape })))
        .collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    })
}

/// Compile a schema only to check that it is well-formed.
pub fn check_json_schema(name: &str, schema: &Value) -> Result<(), SchemaError> {
    ShapeValidator::new(name, schema).map(|_| ())
}

/// A compiled JSON schema together with the name used in error messages.
pub struct ShapeValidator {
    name: String,
    validator: jsonschema::Validator,
}

impl fmt::Debug for ShapeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ShapeValidator {
    pub fn new(name: &str, schema: &Value) -> Result<Self, SchemaError> {
        match jsonschema::validator_for(schema) {
            Ok(validator) => Ok(Self {
                name: name.to_string(),
                validator,
            }),
            Err(e) => Err(SchemaError::InvalidJsonSchema {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        match self.validator.validate(data) {
            Ok(_) => Ok(()),
            Err(e) => Err(ValidationError::Invalid {
                name: self.name.clone(),
                message: e.to_string(),
            }),
        }
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }
}
