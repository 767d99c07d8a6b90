// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::pattern::{ObjIdList, Pattern};
use crate::schema::Schema;
use crate::Rc;

use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// A source of raw object data.
///
/// Implementations fetch the objects matched by pattern chains, e.g. from a
/// database.
pub trait Source {
    /// Retrieve raw data for the objects matched by a list of patterns.
    ///
    /// Returns lists of raw objects keyed by object type name.
    fn oo_query(&self, pattern_list: &[Rc<Pattern>]) -> Result<BTreeMap<String, Vec<Value>>>;

    /// Parse a pattern string and retrieve raw data for the objects it
    /// matches.
    fn oo_query_pattern(
        &self,
        schema: &Schema,
        string: &str,
        obj_id_list_list: Option<&[ObjIdList]>,
    ) -> Result<BTreeMap<String, Vec<Value>>> {
        let pattern_list = Pattern::parse(string, obj_id_list_list, schema)?;
        self.oo_query(&pattern_list)
    }
}
