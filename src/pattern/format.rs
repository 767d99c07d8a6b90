// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::pattern::error::PatternError;
use crate::pattern::grammar::{self, ID_FIELD_UNQUOTED_RE};
use crate::pattern::Pattern;
use crate::schema::ObjIdList;

/// Format an ID field, quoting it unless it consists of unquoted field
/// characters only.
pub fn format_id_field(field: Option<&str>) -> Result<String, PatternError> {
    let unrepresentable = || PatternError::UnrepresentableIdField {
        field: field.map(str::to_string),
    };
    let field = field.ok_or_else(unrepresentable)?;
    if ID_FIELD_UNQUOTED_RE.is_match(field) {
        return Ok(field.to_string());
    }

    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    for c in field.chars() {
        if grammar::is_id_field_quoted_esc_char(c) {
            quoted.push('\\');
        } else if !grammar::is_id_field_quoted_unesc_char(c) {
            return Err(unrepresentable());
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(quoted)
}

/// Format an ID list as a bracketed ID list specification.
pub fn format_id_list_spec(obj_id_list: &ObjIdList) -> Result<String, PatternError> {
    let ids = obj_id_list
        .iter()
        .map(|id| {
            id.iter()
                .map(|field| format_id_field(field.as_deref()))
                .collect::<Result<Vec<_>, _>>()
                .map(|fields| fields.join(", "))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", ids.join("; ")))
}

/// Format a pattern chain as a pattern string.
pub fn format_pattern(pattern: &Pattern) -> Result<String, PatternError> {
    let mut steps: Vec<&Pattern> = pattern.chain().collect();
    steps.reverse();

    let mut string = String::new();
    for step in steps {
        string.push(if step.child() { '>' } else { '<' });
        string.push_str(step.obj_type().name());
        if let Some(obj_id_list) = step.obj_id_list() {
            string.push_str(&format_id_list_spec(obj_id_list)?);
        }
        if step.matched() {
            string.push('#');
        }
    }
    Ok(string)
}
