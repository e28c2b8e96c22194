//! Line tokenizer and typed field access for SMD rows.

use smd_math::Vec3;

use super::parser::{ParseError, ParseResult};

/// Everything after this marker on a line is a comment.
pub const COMMENT_MARKER: &str = "//";

/// Split a line into whitespace-separated fields, dropping any `//` comment.
///
/// A blank or comment-only line yields no fields.
pub fn tokenize(line: &str) -> Vec<&str> {
    let content = match line.find(COMMENT_MARKER) {
        Some(end) => &line[..end],
        None => line,
    };
    content.split_whitespace().collect()
}

/// Strip a leading quote, then independently a trailing quote.
pub fn strip_quotes(name: &str) -> &str {
    let name = name.strip_prefix('"').unwrap_or(name);
    name.strip_suffix('"').unwrap_or(name)
}

/// A tokenized line together with its 1-based line number.
#[derive(Clone, Debug)]
pub struct Row<'a> {
    pub line: usize,
    pub fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    pub fn tokenize(line: usize, text: &'a str) -> Self {
        Self {
            line,
            fields: tokenize(text),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True for a line consisting of exactly this one token.
    pub fn is_single(&self, token: &str) -> bool {
        self.fields.len() == 1 && self.fields[0] == token
    }

    /// Fail unless the row has at least `count` fields.
    pub fn require(&self, count: usize) -> ParseResult<()> {
        if self.fields.len() < count {
            return Err(ParseError::MissingField {
                line: self.line,
                expected: count,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn field(&self, index: usize) -> ParseResult<&'a str> {
        self.fields
            .get(index)
            .copied()
            .ok_or(ParseError::MissingField {
                line: self.line,
                expected: index + 1,
                found: self.fields.len(),
            })
    }

    pub fn f32(&self, index: usize) -> ParseResult<f32> {
        let value = self.field(index)?;
        value.parse::<f32>().map_err(|_| self.invalid_number(index, value))
    }

    pub fn i32(&self, index: usize) -> ParseResult<i32> {
        let value = self.field(index)?;
        value.parse::<i32>().map_err(|_| self.invalid_number(index, value))
    }

    /// Three consecutive floats starting at `index`.
    pub fn vec3(&self, index: usize) -> ParseResult<Vec3> {
        Ok(Vec3::new(self.f32(index)?, self.f32(index + 1)?, self.f32(index + 2)?))
    }

    fn invalid_number(&self, index: usize, value: &str) -> ParseError {
        ParseError::InvalidNumber {
            line: self.line,
            field: index,
            value: value.to_string(),
        }
    }
}
