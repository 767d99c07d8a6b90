// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Patterns: chains of traversal steps over the object type graph.
//!
//! A pattern chain starts at a root step selecting objects of one type, and
//! each further step moves to the children or parents of the objects selected
//! by the previous one. Every step may restrict the objects to an ID list and
//! may be marked for inclusion into the query result.
//!
//! Chains are usually produced by [`Pattern::parse`] from a pattern string,
//! whose syntax is described by [`Pattern::STRING_DOC`].

use crate::schema::{Schema, Type};
use crate::Rc;

use core::fmt;
use log::{debug, trace};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

pub mod error;
mod format;
pub mod grammar;
mod parser;

pub use crate::schema::{ObjId, ObjIdList};
use error::{LookupKind, PatternError};

/// The type expression of a pattern specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeExpr<'a> {
    /// `*`: the furthest related types, repeating traversal until there are
    /// no more relations to follow.
    Any,
    /// A specific related type.
    Name(&'a str),
}

impl<'a> From<&'a str> for TypeExpr<'a> {
    fn from(s: &'a str) -> Self {
        match s {
            "*" => TypeExpr::Any,
            name => TypeExpr::Name(name),
        }
    }
}

/// Which of the traversed types a pattern specification marks for matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchSpec {
    /// Nothing is matched.
    #[default]
    None,
    /// `#`: every traversed type.
    All,
    /// `$`: only the furthest traversed types.
    Furthest,
}

impl MatchSpec {
    /// Convert the optional match character of a specification.
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("#") => MatchSpec::All,
            Some("$") => MatchSpec::Furthest,
            _ => MatchSpec::None,
        }
    }
}

/// A step of a pattern chain. Immutable once created.
pub struct Pattern {
    base: Option<Rc<Pattern>>,
    child: bool,
    obj_type: Rc<Type>,
    obj_id_list: Option<ObjIdList>,
    matched: bool,
}

/// A chain being grown by wildcard expansion, along with the number of steps
/// added to it by the current specification.
#[derive(Clone)]
struct Branch {
    pattern: Rc<Pattern>,
    depth: usize,
}

impl Branch {
    /// Check if the branch went through the named type during the current
    /// specification, counting the step it started from.
    fn visited(&self, type_name: &str) -> bool {
        self.pattern
            .chain()
            .take(self.depth + 1)
            .any(|p| p.obj_type.name() == type_name)
    }
}

impl Pattern {
    /// Documentation of the pattern string syntax.
    pub const STRING_DOC: &'static str = grammar::STRING_DOC;

    /// Create a pattern step.
    ///
    /// A step without a base must be a child step. A step with a base must
    /// have a type which is a child (or a parent) of the base's type. Each ID
    /// in the list must have one element per ID field of the type.
    pub fn new(
        base: Option<Rc<Pattern>>,
        child: bool,
        obj_type: Rc<Type>,
        obj_id_list: Option<ObjIdList>,
        matched: bool,
    ) -> Result<Self, PatternError> {
        match &base {
            None if !child => return Err(PatternError::RootParent(obj_type.name().to_string())),
            None => {}
            Some(base) => {
                let (related, kind) = if child {
                    (base.obj_type.children(), LookupKind::Child)
                } else {
                    (base.obj_type.parents(), LookupKind::Parent)
                };
                if !related.contains_key(obj_type.name()) {
                    return Err(PatternError::NotRelated {
                        kind,
                        type_name: obj_type.name().to_string(),
                        base_type_name: base.obj_type.name().to_string(),
                    });
                }
            }
        }

        if let Some(id_list) = &obj_id_list {
            let expected = obj_type.id_fields().len();
            if let Some(id) = id_list.iter().find(|id| id.len() != expected) {
                return Err(PatternError::IdLength {
                    type_name: obj_type.name().to_string(),
                    expected,
                    actual: id.len(),
                });
            }
        }

        Ok(Self {
            base,
            child,
            obj_type,
            obj_id_list,
            matched,
        })
    }

    /// The previous step, if any.
    pub fn base(&self) -> Option<&Rc<Pattern>> {
        self.base.as_ref()
    }

    /// True if this step selects children of the base's objects, false if it
    /// selects parents. Root steps are always child steps.
    pub fn child(&self) -> bool {
        self.child
    }

    pub fn obj_type(&self) -> &Rc<Type> {
        &self.obj_type
    }

    pub fn obj_id_list(&self) -> Option<&ObjIdList> {
        self.obj_id_list.as_ref()
    }

    /// True if the objects selected by this step are included in the result.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Iterate over the steps of the chain, from this one back to the root.
    pub fn chain(&self) -> impl Iterator<Item = &Pattern> {
        core::iter::successors(Some(self), |&p| p.base.as_deref())
    }

    /// A copy of this step with a different match flag.
    fn with_match(&self, matched: bool) -> Self {
        Self {
            base: self.base.clone(),
            child: self.child,
            obj_type: self.obj_type.clone(),
            obj_id_list: self.obj_id_list.clone(),
            matched,
        }
    }

    /// Look up a type reached over a relation in the schema the patterns
    /// are expanded with.
    fn related_type<'s>(
        schema: &'s Schema,
        child: bool,
        name: &str,
    ) -> Result<&'s Rc<Type>, PatternError> {
        schema
            .get_type(name)
            .ok_or_else(|| PatternError::UnknownType {
                kind: if child {
                    LookupKind::Child
                } else {
                    LookupKind::Parent
                },
                name: name.to_string(),
            })
    }

    /// Extend each pattern in a list by one named type.
    fn expand_name(
        schema: &Schema,
        base_list: &[Rc<Pattern>],
        child: bool,
        name: &str,
        obj_id_list: Option<&ObjIdList>,
        matched: bool,
    ) -> Result<Vec<Rc<Pattern>>, PatternError> {
        if base_list.is_empty() {
            let obj_type = schema
                .get_type(name)
                .ok_or_else(|| PatternError::UnknownType {
                    kind: LookupKind::Root,
                    name: name.to_string(),
                })?;
            return Ok(vec![Rc::new(Pattern::new(
                None,
                true,
                obj_type.clone(),
                obj_id_list.cloned(),
                matched,
            )?)]);
        }

        let mut new_list = vec![];
        for base in base_list {
            let related = if child {
                base.obj_type.children()
            } else {
                base.obj_type.parents()
            };
            if !related.contains_key(name) {
                continue;
            }
            let obj_type = Self::related_type(schema, child, name)?;
            new_list.push(Rc::new(Pattern::new(
                Some(base.clone()),
                child,
                obj_type.clone(),
                obj_id_list.cloned(),
                matched,
            )?));
        }

        if new_list.is_empty() {
            return Err(PatternError::UnknownType {
                kind: if child {
                    LookupKind::Child
                } else {
                    LookupKind::Parent
                },
                name: name.to_string(),
            });
        }
        Ok(new_list)
    }

    /// Run one round of wildcard expansion: extend every branch along every
    /// relation in the direction, leaving branches with nowhere to go as is.
    fn expand_round(
        schema: &Schema,
        branches: &[Branch],
        child: bool,
        obj_id_list: Option<&ObjIdList>,
        matched: bool,
    ) -> Result<Vec<Branch>, PatternError> {
        let mut new_branches = vec![];
        for branch in branches {
            let related = if child {
                branch.pattern.obj_type.children()
            } else {
                branch.pattern.obj_type.parents()
            };
            let mut extended = false;
            for name in related.keys() {
                if branch.visited(name) {
                    continue;
                }
                let obj_type = Self::related_type(schema, child, name)?;
                new_branches.push(Branch {
                    pattern: Rc::new(Pattern::new(
                        Some(branch.pattern.clone()),
                        child,
                        obj_type.clone(),
                        obj_id_list.cloned(),
                        matched,
                    )?),
                    depth: branch.depth + 1,
                });
                extended = true;
            }
            if !extended {
                new_branches.push(branch.clone());
            }
        }
        Ok(new_branches)
    }

    /// Extend each pattern in a list along all relations in the direction,
    /// repeatedly, until the list stops changing.
    fn expand_any(
        schema: &Schema,
        base_list: &[Rc<Pattern>],
        child: bool,
        obj_id_list: Option<&ObjIdList>,
        matched: bool,
    ) -> Result<Vec<Rc<Pattern>>, PatternError> {
        let mut branches = if base_list.is_empty() {
            // Start from every type in the schema
            schema
                .types()
                .values()
                .map(|t| {
                    Ok(Branch {
                        pattern: Rc::new(Pattern::new(
                            None,
                            true,
                            t.clone(),
                            obj_id_list.cloned(),
                            matched,
                        )?),
                        depth: 1,
                    })
                })
                .collect::<Result<Vec<_>, PatternError>>()?
        } else {
            base_list
                .iter()
                .map(|p| Branch {
                    pattern: p.clone(),
                    depth: 0,
                })
                .collect()
        };

        let mut round = 0;
        loop {
            round += 1;
            let new_branches = Self::expand_round(schema, &branches, child, obj_id_list, matched)?;
            trace!(
                "wildcard round {round}: {} -> {} pattern(s)",
                branches.len(),
                new_branches.len()
            );
            let done = new_branches.len() == branches.len()
                && new_branches
                    .iter()
                    .zip(branches.iter())
                    .all(|(a, b)| a.pattern == b.pattern);
            branches = new_branches;
            if done {
                break;
            }
        }

        Ok(branches.into_iter().map(|b| b.pattern).collect())
    }

    /// Expand a list of patterns by one pattern specification.
    ///
    /// Returns the new list of trailing patterns. With an empty `base_list`
    /// the patterns start at the root.
    ///
    /// [`TypeExpr::Any`] keeps extending each chain until the list stops
    /// changing. It never steps into a type the same chain already traversed
    /// during this expansion, including the type it started from, so a chain
    /// following a cycle stops where the cycle closes. Chains with nowhere
    /// else to go are returned unchanged.
    pub fn expand(
        schema: &Schema,
        base_list: &[Rc<Pattern>],
        child: bool,
        obj_type_expr: TypeExpr<'_>,
        obj_id_list: Option<&ObjIdList>,
        match_spec: MatchSpec,
    ) -> Result<Vec<Rc<Pattern>>, PatternError> {
        if base_list.is_empty() && !child {
            return Err(PatternError::MissingParentBase);
        }

        let new_list = match obj_type_expr {
            TypeExpr::Name(name) => Self::expand_name(
                schema,
                base_list,
                child,
                name,
                obj_id_list,
                match_spec != MatchSpec::None,
            )?,
            TypeExpr::Any => {
                let list = Self::expand_any(
                    schema,
                    base_list,
                    child,
                    obj_id_list,
                    match_spec == MatchSpec::All,
                )?;
                if match_spec == MatchSpec::Furthest {
                    list.into_iter()
                        .map(|p| {
                            if p.matched {
                                p
                            } else {
                                Rc::new(p.with_match(true))
                            }
                        })
                        .collect()
                } else {
                    list
                }
            }
        };

        debug!(
            "expanded {} pattern(s) into {} by {}{obj_type_expr:?}",
            base_list.len(),
            new_list.len(),
            if child { '>' } else { '<' },
        );
        Ok(new_list)
    }

    /// Parse a pattern string into a list of trailing patterns.
    ///
    /// `obj_id_list_list` supplies the ID lists for `%` placeholders in order,
    /// and must be consumed completely. Without it placeholders are rejected.
    pub fn parse(
        string: &str,
        obj_id_list_list: Option<&[ObjIdList]>,
        schema: &Schema,
    ) -> Result<Vec<Rc<Pattern>>, PatternError> {
        parser::Parser::new(schema, string, obj_id_list_list).parse()
    }

    /// Format the chain ending with this step as a pattern string, which
    /// parses back into the same chain.
    pub fn format(&self) -> Result<String, PatternError> {
        format::format_pattern(self)
    }

    /// Create a list of matched root patterns selecting every object in I/O
    /// data: a map of plural type names (e.g. "builds") to object lists.
    pub fn from_io(io_data: &Value, schema: &Schema) -> Result<Vec<Rc<Pattern>>, PatternError> {
        let mut pattern_list = vec![];
        for (name, obj_type) in schema.types() {
            let list = format!("{name}s");
            let objs = match io_data.get(&list).and_then(Value::as_array) {
                Some(objs) if !objs.is_empty() => objs,
                _ => continue,
            };
            let obj_id_list = objs
                .iter()
                .enumerate()
                .map(|(index, obj)| {
                    obj_type
                        .id_fields()
                        .iter()
                        .map(|field| match obj.get(field) {
                            Some(Value::String(s)) => Ok(Some(s.clone())),
                            _ => Err(PatternError::InvalidIoObject {
                                list: list.clone(),
                                index,
                                field: field.clone(),
                            }),
                        })
                        .collect::<Result<ObjId, _>>()
                })
                .collect::<Result<ObjIdList, _>>()?;
            pattern_list.push(Rc::new(Pattern::new(
                None,
                true,
                obj_type.clone(),
                Some(obj_id_list),
                true,
            )?));
        }
        Ok(pattern_list)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.child == other.child
            && self.matched == other.matched
            && self.obj_type.name() == other.obj_type.name()
            && self.obj_id_list == other.obj_id_list
            && match (&self.base, &other.base) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a == b,
                _ => false,
            }
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("base", &self.base)
            .field("child", &self.child)
            .field("obj_type", &self.obj_type.name())
            .field("obj_id_list", &self.obj_id_list)
            .field("matched", &self.matched)
            .finish()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Pattern", 5)?;
        s.serialize_field("base", &self.base.as_deref())?;
        s.serialize_field("child", &self.child)?;
        s.serialize_field("obj_type", self.obj_type.name())?;
        s.serialize_field("obj_id_list", &self.obj_id_list)?;
        s.serialize_field("match", &self.matched)?;
        s.end()
    }
}
