// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Object types, the parent/child relations between them, and the schema
//! tying them together.
//!
//! A schema is built once from a declarative description: a map of type names
//! to [`TypeDef`] records, listing the JSON schemas of each type's fields, the
//! fields which must not be null, the fields identifying an object globally and
//! the child types referencing it. For example (in YAML):
//!
//! ```yaml
//! checkout:
//!   field_json_schemas:
//!     id: {type: string}
//!     origin: {type: string}
//!   required_fields: [id, origin]
//!   id_fields: [id]
//!   children:
//!     build: [checkout_id]
//! build:
//!   field_json_schemas:
//!     id: {type: string}
//!     checkout_id: {type: string}
//!   required_fields: [id, checkout_id]
//!   id_fields: [id]
//! ```
//!
//! Types are kept in a name-indexed arena owned by the [`Schema`]. Relations
//! refer to their endpoints by name, so the type graph may contain cycles
//! without creating ownership cycles.

use crate::Rc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::BTreeSet;
use std::path::Path;

pub mod error;
pub mod validate;

use error::{SchemaError, ValidationError};
use validate::ShapeValidator;

/// Values of an object's identifying fields, in the order of the type's ID
/// fields. A missing component matches any value.
pub type ObjId = Vec<Option<String>>;

/// A list of object identities.
pub type ObjIdList = Vec<ObjId>;

const KCIDB_SCHEMA: &str = include_str!("schema/kcidb.schema.json");

#[cfg(feature = "arc")]
lazy_static::lazy_static! {
    /// The schema of CI report objects: revisions, checkouts, builds and tests.
    /// Built on first use from the bundled description.
    pub static ref SCHEMA: Schema = {
        Schema::kcidb().expect("bundled schema description should be valid")
    };
}

/// Declarative description of an object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    /// JSON schemas of field values, keyed by field name.
    pub field_json_schemas: IndexMap<String, Value>,
    /// Fields which may not be null.
    #[serde(default)]
    pub required_fields: BTreeSet<String>,
    /// Fields identifying an object globally.
    pub id_fields: Vec<String>,
    /// Child type names, each with the names of the child fields holding the
    /// values of this type's ID fields, in the same order.
    #[serde(default)]
    pub children: IndexMap<String, Vec<String>>,
}

/// A parent/child relation between object types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    parent: String,
    child: String,
    ref_fields: Vec<String>,
}

impl Relation {
    /// Create a relation. `ref_fields` names the child fields containing the
    /// values of the parent's ID fields, in the same order.
    pub fn new(parent: &Type, child: &Type, ref_fields: Vec<String>) -> Result<Self, SchemaError> {
        if ref_fields.len() != parent.id_fields.len() {
            return Err(SchemaError::RefFieldCount {
                parent: parent.name.clone(),
                child: child.name.clone(),
                expected: parent.id_fields.len(),
                actual: ref_fields.len(),
            });
        }
        Ok(Self {
            parent: parent.name.clone(),
            child: child.name.clone(),
            ref_fields,
        })
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn child(&self) -> &str {
        &self.child
    }

    pub fn ref_fields(&self) -> &[String] {
        &self.ref_fields
    }
}

/// An object type.
#[derive(Debug)]
pub struct Type {
    name: String,
    json_schema: Value,
    validator: ShapeValidator,
    id_fields: Vec<String>,
    relations: Vec<Rc<Relation>>,
    parents: IndexMap<String, Rc<Relation>>,
    children: IndexMap<String, Rc<Relation>>,
}

impl Type {
    /// Create a type without relations.
    pub fn new(name: &str, json_schema: Value, id_fields: Vec<String>) -> Result<Self, SchemaError> {
        if id_fields.is_empty() {
            return Err(SchemaError::NoIdFields(name.to_string()));
        }
        let validator = ShapeValidator::new(name, &json_schema)?;
        Ok(Self {
            name: name.to_string(),
            json_schema,
            validator,
            id_fields,
            relations: vec![],
            parents: IndexMap::new(),
            children: IndexMap::new(),
        })
    }

    /// Register a relation having this type as the parent, the child, or both.
    pub fn add_relation(&mut self, relation: Rc<Relation>) -> Result<(), SchemaError> {
        if relation.parent != self.name && relation.child != self.name {
            return Err(SchemaError::NotAnEndpoint {
                type_name: self.name.clone(),
                parent: relation.parent.clone(),
                child: relation.child.clone(),
            });
        }
        if self.relations.iter().any(|r| Rc::ptr_eq(r, &relation)) {
            return Err(SchemaError::DuplicateRelation {
                type_name: self.name.clone(),
                parent: relation.parent.clone(),
                child: relation.child.clone(),
            });
        }
        if relation.parent == self.name {
            self.children
                .insert(relation.child.clone(), relation.clone());
        }
        if relation.child == self.name {
            self.parents
                .insert(relation.parent.clone(), relation.clone());
        }
        self.relations.push(relation);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The JSON schema of a single object of this type.
    pub fn json_schema(&self) -> &Value {
        &self.json_schema
    }

    pub fn id_fields(&self) -> &[String] {
        &self.id_fields
    }

    /// All relations this type takes part in, in registration order.
    pub fn relations(&self) -> &[Rc<Relation>] {
        &self.relations
    }

    /// Relations to parent types, keyed by parent type name.
    pub fn parents(&self) -> &IndexMap<String, Rc<Relation>> {
        &self.parents
    }

    /// Relations to child types, keyed by child type name.
    pub fn children(&self) -> &IndexMap<String, Rc<Relation>> {
        &self.children
    }

    pub fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        self.validator.validate(data)
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }

    /// Retrieve the values of the fields identifying an object globally.
    ///
    /// The object is validated first, unless light assertions are enabled.
    pub fn get_id(&self, data: &Value) -> Result<ObjId, ValidationError> {
        if !crate::light_asserts() {
            self.validate(data)?;
        }
        self.id_fields
            .iter()
            .map(|field| match data.get(field) {
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(Value::Null) => Ok(None),
                Some(v) => Err(ValidationError::InvalidIdValue {
                    type_name: self.name.clone(),
                    field: field.clone(),
                    value: v.to_string(),
                }),
                None => Err(ValidationError::MissingIdField {
                    type_name: self.name.clone(),
                    field: field.clone(),
                }),
            })
            .collect()
    }
}

/// A repository of recognized object types and their relations.
#[derive(Debug)]
pub struct Schema {
    types: IndexMap<String, Rc<Type>>,
    relations: Vec<Rc<Relation>>,
    json_schema: Value,
    validator: ShapeValidator,
}

fn is_type_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

fn check_type_def(name: &str, def: &TypeDef) -> Result<(), SchemaError> {
    if !is_type_name(name) {
        return Err(SchemaError::InvalidTypeName(name.to_string()));
    }
    if def.id_fields.is_empty() {
        return Err(SchemaError::NoIdFields(name.to_string()));
    }
    let mut seen = BTreeSet::new();
    for field in &def.id_fields {
        if !def.field_json_schemas.contains_key(field) {
            return Err(SchemaError::UnknownIdField {
                type_name: name.to_string(),
                field: field.clone(),
            });
        }
        if !seen.insert(field) {
            return Err(SchemaError::DuplicateIdField {
                type_name: name.to_string(),
                field: field.clone(),
            });
        }
    }
    if let Some(field) = def
        .required_fields
        .iter()
        .find(|f| !def.field_json_schemas.contains_key(*f))
    {
        return Err(SchemaError::UnknownRequiredField {
            type_name: name.to_string(),
            field: field.clone(),
        });
    }
    for (field, field_schema) in &def.field_json_schemas {
        validate::check_json_schema(&format!("{name}.{field}"), field_schema)?;
    }
    Ok(())
}

impl Schema {
    /// Build a schema from a description of its types.
    pub fn new(description: IndexMap<String, TypeDef>) -> Result<Self, SchemaError> {
        // Create the types
        let mut types: IndexMap<String, Type> = IndexMap::new();
        for (name, def) in &description {
            check_type_def(name, def)?;
            let t = Type::new(name, validate::instance_shape(def), def.id_fields.clone())?;
            types.insert(name.clone(), t);
        }

        let json_schema =
            validate::composed_shape(types.iter().map(|(name, t)| (name, &t.json_schema)));
        let validator = ShapeValidator::new("schema", &json_schema)?;

        // Create and register the relations
        let mut relations = vec![];
        for (name, def) in &description {
            for (child_name, ref_fields) in &def.children {
                let child_def = match description.get(child_name) {
                    Some(d) => d,
                    None => {
                        return Err(SchemaError::UnknownChild {
                            parent: name.clone(),
                            child: child_name.clone(),
                        })
                    }
                };
                if let Some(field) = ref_fields
                    .iter()
                    .find(|f| !child_def.field_json_schemas.contains_key(*f))
                {
                    return Err(SchemaError::UnknownRefField {
                        parent: name.clone(),
                        child: child_name.clone(),
                        field: field.clone(),
                    });
                }

                let relation = Rc::new(Relation::new(
                    &types[name.as_str()],
                    &types[child_name.as_str()],
                    ref_fields.clone(),
                )?);
                if let Some(t) = types.get_mut(name) {
                    t.add_relation(relation.clone())?;
                }
                // A type being its own child has the relation registered once
                if child_name != name {
                    if let Some(t) = types.get_mut(child_name) {
                        t.add_relation(relation.clone())?;
                    }
                }
                relations.push(relation);
            }
        }

        debug!(
            "built schema with {} type(s) and {} relation(s)",
            types.len(),
            relations.len()
        );

        Ok(Self {
            types: types.into_iter().map(|(n, t)| (n, Rc::new(t))).collect(),
            relations,
            json_schema,
            validator,
        })
    }

    /// Build a schema from a JSON description.
    pub fn from_json_str(description: &str) -> Result<Self, SchemaError> {
        Self::new(serde_json::from_str(description)?)
    }

    /// Build a schema from a YAML description.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(description: &str) -> Result<Self, SchemaError> {
        Self::new(serde_yaml::from_str(description)?)
    }

    /// Build a schema from a description file, JSON or YAML depending on the
    /// file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let result = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            _ => {
                return Err(SchemaError::Load {
                    path: display,
                    message: "unsupported file type".to_string(),
                })
            }
        };

        result.map_err(|e| match e {
            SchemaError::Load { message, .. } => SchemaError::Load {
                path: display,
                message,
            },
            e => e,
        })
    }

    /// Build the schema of CI report objects from the bundled description.
    pub fn kcidb() -> Result<Self, SchemaError> {
        Self::from_json_str(KCIDB_SCHEMA)
    }

    /// Types keyed by name, in declaration order.
    pub fn types(&self) -> &IndexMap<String, Rc<Type>> {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&Rc<Type>> {
        self.types.get(name)
    }

    pub fn relations(&self) -> &[Rc<Relation>] {
        &self.relations
    }

    /// The JSON schema of a collection of objects: a map of type names to
    /// arrays of objects.
    pub fn json_schema(&self) -> &Value {
        &self.json_schema
    }

    pub fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        self.validator.validate(data)
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }

    /// Format the directed graph of type relations using the DOT language,
    /// e.g. for rendering with `dot -Tx11`.
    pub fn format_dot(&self) -> String {
        let mut dot = String::from("digraph {\n");
        for r in &self.relations {
            dot.push_str(&format!("{} -> {}\n", r.parent, r.child));
        }
        dot.push_str("}\n");
        dot
    }
}
