// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::pattern::error::PatternError;
use crate::pattern::grammar::{self, PATTERN_RE};
use crate::pattern::{MatchSpec, Pattern, TypeExpr};
use crate::schema::{ObjId, ObjIdList, Schema};
use crate::Rc;

use core::iter::Peekable;
use core::str::CharIndices;
use log::debug;

/// Reader of an inline ID list, the text between the brackets of an ID list
/// specification.
struct IdListReader<'source> {
    text: &'source str,
    iter: Peekable<CharIndices<'source>>,
}

impl<'source> IdListReader<'source> {
    fn new(text: &'source str) -> Self {
        Self {
            text,
            iter: text.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, c)| *c)
    }

    fn offset(&mut self) -> usize {
        match self.iter.peek() {
            Some((idx, _)) => *idx,
            None => self.text.len(),
        }
    }

    fn error(&mut self) -> PatternError {
        PatternError::InvalidIdList {
            text: self.text.to_string(),
            pos: self.offset(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if grammar::is_whitespace(c)) {
            self.iter.next();
        }
    }

    fn read_quoted_field(&mut self) -> Result<String, PatternError> {
        // Opening doublequote
        self.iter.next();
        let mut field = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.iter.next();
                    return Ok(field);
                }
                Some('\\') => {
                    self.iter.next();
                    match self.peek() {
                        Some(c) if grammar::is_id_field_quoted_esc_char(c) => {
                            field.push(c);
                            self.iter.next();
                        }
                        _ => return Err(self.error()),
                    }
                }
                Some(c) if grammar::is_id_field_quoted_unesc_char(c) => {
                    field.push(c);
                    self.iter.next();
                }
                _ => return Err(self.error()),
            }
        }
    }

    fn read_unquoted_field(&mut self) -> Result<String, PatternError> {
        let start = self.offset();
        while matches!(self.peek(), Some(c) if grammar::is_id_field_unquoted_char(c)) {
            self.iter.next();
        }
        let end = self.offset();
        if start == end {
            return Err(self.error());
        }
        Ok(self.text[start..end].to_string())
    }

    fn read_id(&mut self) -> Result<ObjId, PatternError> {
        let mut id = vec![];
        loop {
            let field = match self.peek() {
                Some('"') => self.read_quoted_field()?,
                _ => self.read_unquoted_field()?,
            };
            id.push(Some(field));
            self.skip_ws();
            if self.peek() != Some(',') {
                return Ok(id);
            }
            self.iter.next();
            self.skip_ws();
        }
    }

    fn read_id_list(mut self) -> Result<ObjIdList, PatternError> {
        let mut id_list = vec![];
        self.skip_ws();
        loop {
            id_list.push(self.read_id()?);
            if self.peek() != Some(';') {
                break;
            }
            self.iter.next();
            self.skip_ws();
        }
        match self.peek() {
            None => Ok(id_list),
            Some(_) => Err(self.error()),
        }
    }
}

/// Parse an ID list from its text, without the surrounding brackets.
pub fn parse_id_list(text: &str) -> Result<ObjIdList, PatternError> {
    IdListReader::new(text).read_id_list()
}

/// Parser of pattern strings into lists of pattern chains.
pub struct Parser<'source> {
    schema: &'source Schema,
    string: &'source str,
    id_lists: Option<core::slice::Iter<'source, ObjIdList>>,
}

impl<'source> Parser<'source> {
    /// Create a parser for `string`. `obj_id_list_list` supplies the ID lists
    /// substituted for `%` placeholders, in order. If it's `None`,
    /// placeholders are not allowed.
    pub fn new(
        schema: &'source Schema,
        string: &'source str,
        obj_id_list_list: Option<&'source [ObjIdList]>,
    ) -> Self {
        Self {
            schema,
            string,
            id_lists: obj_id_list_list.map(|l| l.iter()),
        }
    }

    /// Resolve the optional ID list specification of a pattern specification
    /// starting at `pos`.
    fn parse_spec(
        &mut self,
        spec: Option<&str>,
        pos: usize,
    ) -> Result<Option<ObjIdList>, PatternError> {
        match spec {
            None => Ok(None),
            Some("%") => match &mut self.id_lists {
                None => Err(PatternError::NoIdLists { pos }),
                Some(iter) => match iter.next() {
                    Some(id_list) => Ok(Some(id_list.clone())),
                    None => Err(PatternError::NotEnoughIdLists { pos }),
                },
            },
            Some(s) => {
                let inner = s
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .ok_or_else(|| PatternError::InvalidIdList {
                        text: s.to_string(),
                        pos: 0,
                    })?;
                parse_id_list(inner).map(Some)
            }
        }
    }

    /// Parse the string into the list of trailing pattern chains.
    pub fn parse(mut self) -> Result<Vec<Rc<Pattern>>, PatternError> {
        let string = self.string;
        let mut pattern_list: Vec<Rc<Pattern>> = vec![];
        let mut pos = 0;

        while pos < string.len() {
            let rest = &string[pos..];
            let caps = match PATTERN_RE.captures(rest) {
                Some(caps) => caps,
                None => {
                    return Err(PatternError::Syntax {
                        string: string.to_string(),
                        pos,
                        rest: rest.to_string(),
                    })
                }
            };
            let (Some(all), Some(relation), Some(obj_type_expr)) =
                (caps.get(0), caps.name("relation"), caps.name("type"))
            else {
                return Err(PatternError::Syntax {
                    string: string.to_string(),
                    pos,
                    rest: rest.to_string(),
                });
            };

            let obj_id_list = self.parse_spec(caps.name("spec").map(|m| m.as_str()), pos)?;
            let match_spec = MatchSpec::from_str_opt(caps.name("match").map(|m| m.as_str()));
            let child = relation.as_str() == ">";

            pattern_list = Pattern::expand(
                self.schema,
                &pattern_list,
                child,
                TypeExpr::from(obj_type_expr.as_str()),
                obj_id_list.as_ref(),
                match_spec,
            )
            .map_err(|e| PatternError::Expansion {
                pos,
                rest: rest.to_string(),
                source: Box::new(e),
            })?;

            pos += all.end();
        }

        if matches!(&self.id_lists, Some(iter) if iter.len() > 0) {
            return Err(PatternError::TooManyIdLists {
                string: string.to_string(),
            });
        }

        debug!(
            "parsed pattern string '{string}' into {} pattern(s)",
            pattern_list.len()
        );
        Ok(pattern_list)
    }
}
