// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Regular expressions implementing the pattern string grammar.
//!
//! Patterns are assembled from fragments named after the ABNF rules in
//! [`STRING_DOC`]. Whitespace is the ABNF `%x09-0d / %x20` set.

use lazy_static::lazy_static;
use regex::Regex;

/// Whitespace character.
pub const WHITESPACE: &str = r"[\x09-\x0d\x20]";

/// Characters permitted in an unquoted ID field.
pub const ID_FIELD_UNQUOTED: &str = r"[0-9A-Za-z_:/.?%+-]+";

/// Characters which may appear unescaped in a quoted ID field:
/// printable ASCII except doublequote and backslash.
pub const ID_FIELD_QUOTED_UNESC_CHAR: &str = r"[\x20-\x21\x23-\x5b\x5d-\x7e]";

/// Characters which must be backslash-escaped in a quoted ID field.
pub const ID_FIELD_QUOTED_ESC_CHAR: &str = r#"["\\]"#;

/// Whitespace as accepted by the grammar.
pub fn is_whitespace(c: char) -> bool {
    matches!(c, '\x09'..='\x0d' | ' ')
}

/// A character accepted in an unquoted ID field.
pub fn is_id_field_unquoted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '/' | '.' | '?' | '%' | '+' | '-')
}

/// A character accepted without escaping in a quoted ID field.
pub fn is_id_field_quoted_unesc_char(c: char) -> bool {
    matches!(c, '\x20'..='\x21' | '\x23'..='\x5b' | '\x5d'..='\x7e')
}

/// A character needing a backslash in a quoted ID field.
pub fn is_id_field_quoted_esc_char(c: char) -> bool {
    matches!(c, '"' | '\\')
}

fn id_field_quoted() -> String {
    format!(r#""(?:{ID_FIELD_QUOTED_UNESC_CHAR}|\\{ID_FIELD_QUOTED_ESC_CHAR})*""#)
}

fn id_field() -> String {
    format!("(?:{ID_FIELD_UNQUOTED}|{})", id_field_quoted())
}

fn id() -> String {
    let field = id_field();
    format!("{field}(?:{WHITESPACE}*,{WHITESPACE}*{field})*")
}

fn id_list() -> String {
    let id = id();
    format!("{id}(?:{WHITESPACE}*;{WHITESPACE}*{id})*")
}

fn spec() -> String {
    format!(r"(?:%|\[{WHITESPACE}*{}{WHITESPACE}*\])", id_list())
}

fn pattern() -> String {
    let ws = WHITESPACE;
    format!(
        concat!(
            r"^{ws}*",
            r"(?P<relation>[<>]){ws}*",
            r"(?P<type>[a-z0-9_]+|\*){ws}*",
            r"(?P<spec>{spec})?{ws}*",
            r"(?P<match>[#$])?{ws}*",
        ),
        ws = ws,
        spec = spec()
    )
}

lazy_static! {
    /// Matches one pattern specification at the start of the haystack.
    /// Group names correspond to ABNF rules.
    pub static ref PATTERN_RE: Regex = {
        Regex::new(&pattern()).expect("pattern grammar should compile")
    };

    /// Matches a complete unquoted ID field.
    pub static ref ID_FIELD_UNQUOTED_RE: Regex = {
        Regex::new(&format!("^{ID_FIELD_UNQUOTED}$")).expect("ID field grammar should compile")
    };
}

/// Documentation of the pattern string syntax.
pub const STRING_DOC: &str = r##"A pattern string is a sequence of pattern specifications. Each specification
is a relation character, an object type, an optional ID list and an optional
matching scope. In ABNF:

    whitespace = %x09-0d / %x20
                        ; Whitespace characters
    relation = ">" /    ; Children of the types on the left,
                        ; or root types if there is nothing on the left
               "<"      ; Parents of the types on the left
    type = name /       ; A parent/child type with the specified name
           "*"          ; The furthest parents/children of the types on the
                        ; left, or those types themselves if they have none.
                        ; Never returns to a type already traversed by the
                        ; same specification, so cycles end where they close.
    name_char = %x30-39 / %x61-7a / "_"
                        ; Lower-case letters, digits, underscore
    name = 1*name_char  ; Type name
    id_field_unquoted_char = %x30-39 / %x41-5a / %x61-7a /
                             "_" / ":" / "/" / "." / "?" / "%" / "+" / "-"
                        ; Characters allowed in unquoted ID fields
    id_field_quoted_token = (%x20-21 / %x23-5b / %x5d-7e) /
                            "\" (%x22 / %x5c)
                        ; Printable characters except doublequote and
                        ; backslash, or a backslash-escaped doublequote or
                        ; backslash
    id_field = 1*id_field_unquoted_char /
               %x22 *id_field_quoted_token %x22
                        ; Unquoted or quoted ID field
    id = id_field *(*whitespace "," *whitespace id_field)
                        ; ID: a sequence of ID fields
    id_list = id *(*whitespace ";" *whitespace id)
                        ; A list of IDs
    spec = "%" /        ; ID list placeholder. Takes the next ID list from
                        ; the separately supplied list of ID lists and
                        ; limits every type traversed by this specification
                        ; to it. Not allowed if no such list is supplied.
           "[" *whitespace id_list *whitespace "]"
                        ; Inline ID list
    match = "#" /       ; Match objects of every type traversed by this
                        ; specification
            "$"         ; Match objects of only the furthest types traversed
                        ; by this specification
    pattern = *whitespace relation *whitespace type
              [*whitespace spec] [*whitespace match]
    pattern_string = 1*pattern *whitespace

Examples:
    >build%#            Builds with IDs from the first of the separately
                        supplied ID lists.
    >build%$            The same.
    >build[redhat:1077837]
                        The build with ID "redhat:1077837" (not matched).
    >build[redhat:1077837]#
                        Match the build with ID "redhat:1077837".
    >checkout%>build#   Builds of the checkouts with IDs from the first
                        separately supplied ID list.
    >test%<build#       Builds of the tests with IDs from the first
                        separately supplied ID list.
    >test[redhat:1077834_0; redhat:1077834_1]<build#
                        Builds of the tests with IDs "redhat:1077834_0" and
                        "redhat:1077834_1".
    >test%<*#           Tests with IDs from the first separately supplied
                        ID list, and all their parents.
    >test%<*$           Only the furthest parents of those tests, or the
                        tests themselves if they have no parent types.
    >revision%#>*#      Revisions with IDs from the first separately
                        supplied ID list, and all their children.
    >revision[c763deac7ff, 932e2d61add]#>*#
                        The revision with ID (c763deac7ff, 932e2d61add) and
                        all its children.
    >test%<*$>*#        The root objects containing the tests with IDs from
                        the first separately supplied ID list, along with all
                        their children.
    >*#                 Everything in the database.
    >*$                 Objects of all childless types.
"##;
