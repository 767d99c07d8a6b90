// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{anyhow, Result};
use kcidb_orm::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A source serving objects from I/O data held in memory.
struct MemorySource {
    data: Value,
}

fn get_values(obj: &Value, fields: &[String]) -> ObjId {
    fields
        .iter()
        .map(|f| obj.get(f).and_then(Value::as_str).map(str::to_string))
        .collect()
}

impl MemorySource {
    fn objects(&self, obj_type: &Type) -> Vec<&Value> {
        match self.data.get(format!("{}s", obj_type.name())) {
            Some(Value::Array(objs)) => objs.iter().collect(),
            _ => vec![],
        }
    }

    fn select<'a>(
        &'a self,
        pattern: &Pattern,
        result: &mut BTreeMap<String, Vec<Value>>,
    ) -> Result<Vec<&'a Value>> {
        let obj_type = pattern.obj_type();
        let mut objs = self.objects(obj_type);

        if let Some(base) = pattern.base() {
            let base_objs = self.select(base, result)?;
            let base_type = base.obj_type();
            let related = if pattern.child() {
                base_type.children()
            } else {
                base_type.parents()
            };
            let relation = related.get(obj_type.name()).ok_or_else(|| {
                anyhow!("no relation between {} and {}", base_type.name(), obj_type.name())
            })?;
            objs.retain(|obj| {
                base_objs.iter().any(|base_obj| {
                    if pattern.child() {
                        get_values(obj, relation.ref_fields())
                            == get_values(base_obj, base_type.id_fields())
                    } else {
                        get_values(base_obj, relation.ref_fields())
                            == get_values(obj, obj_type.id_fields())
                    }
                })
            });
        }

        if let Some(id_list) = pattern.obj_id_list() {
            objs.retain(|obj| id_list.contains(&get_values(obj, obj_type.id_fields())));
        }

        if pattern.matched() && !objs.is_empty() {
            let matched = result.entry(obj_type.name().to_string()).or_default();
            for obj in &objs {
                if !matched.contains(*obj) {
                    matched.push((*obj).clone());
                }
            }
        }
        Ok(objs)
    }
}

impl Source for MemorySource {
    fn oo_query(&self, pattern_list: &[Rc<Pattern>]) -> Result<BTreeMap<String, Vec<Value>>> {
        let mut result = BTreeMap::new();
        for pattern in pattern_list {
            self.select(pattern, &mut result)?;
        }
        Ok(result)
    }
}

fn source() -> MemorySource {
    MemorySource {
        data: json!({
            "version": {"major": 4, "minor": 0},
            "checkouts": [
                {"id": "origin:c1", "origin": "origin"},
                {"id": "origin:c2", "origin": "origin"}
            ],
            "builds": [
                {"id": "origin:b1", "origin": "origin", "checkout_id": "origin:c1"},
                {"id": "origin:b2", "origin": "origin", "checkout_id": "origin:c1"},
                {"id": "origin:b3", "origin": "origin", "checkout_id": "origin:c2"}
            ],
            "tests": [
                {"id": "origin:t1", "origin": "origin", "build_id": "origin:b1"},
                {"id": "origin:t2", "origin": "origin", "build_id": "origin:b1"},
                {"id": "origin:t3", "origin": "origin", "build_id": "origin:b2"}
            ]
        }),
    }
}

fn ids(result: &BTreeMap<String, Vec<Value>>) -> BTreeMap<String, Vec<String>> {
    result
        .iter()
        .map(|(name, objs)| {
            (
                name.clone(),
                objs.iter()
                    .filter_map(|o| o["id"].as_str().map(str::to_string))
                    .collect(),
            )
        })
        .collect()
}

fn query(string: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let schema = Schema::kcidb()?;
    Ok(ids(&source().oo_query_pattern(&schema, string, None)?))
}

#[test]
fn parents() -> Result<()> {
    assert_eq!(
        query(">test[origin:t3]<build#<checkout#")?,
        BTreeMap::from([
            ("build".to_string(), vec!["origin:b2".to_string()]),
            ("checkout".to_string(), vec!["origin:c1".to_string()]),
        ])
    );
    Ok(())
}

#[test]
fn children() -> Result<()> {
    let result = query(">checkout[origin:c1]>*#")?;
    assert_eq!(result["build"], ["origin:b1", "origin:b2"]);
    assert_eq!(result["test"], ["origin:t1", "origin:t2", "origin:t3"]);
    assert!(!result.contains_key("checkout"));

    let result = query(">checkout[origin:c2]>*$")?;
    // No tests for the only build of the checkout
    assert!(result.is_empty());
    Ok(())
}

#[test]
fn placeholders() -> Result<()> {
    let schema = Schema::kcidb()?;
    let id_lists = vec![vec![vec![Some("origin:b3".to_string())]]];
    let result = source().oo_query_pattern(&schema, ">build%<checkout#", Some(id_lists.as_slice()))?;
    assert_eq!(
        ids(&result),
        BTreeMap::from([("checkout".to_string(), vec!["origin:c2".to_string()])])
    );
    Ok(())
}

#[test]
fn from_io() -> Result<()> {
    let schema = Schema::kcidb()?;
    let source = source();
    let pattern_list = Pattern::from_io(&source.data, &schema)?;
    assert_eq!(pattern_list.len(), 3);
    let result = source.oo_query(&pattern_list)?;
    for name in ["checkout", "build", "test"] {
        assert_eq!(
            Some(&result[name]),
            source.data[format!("{name}s")].as_array()
        );
    }
    Ok(())
}

#[test]
fn invalid_pattern() {
    let err = query(">bogus#").unwrap_err();
    assert!(format!("{err:#}").contains("Cannot find type 'bogus'"));
}
