//! Filter expressions for the host library.
//!
//! The host understands a small boolean language: `FIELD IS "value"` clauses
//! joined with `AND`. This module builds those expressions for the two
//! canonical panel queries and parses them back, so quoting lives in one
//! place.

use crate::error::{LibraryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title-format reference for the track artist.
pub const ARTIST_FIELD: &str = "%artist%";
/// Title-format reference for the album artist.
pub const ALBUM_ARTIST_FIELD: &str = "%albumartist%";
/// Title-format reference for the album.
pub const ALBUM_FIELD: &str = "%album%";

/// Field used to scope queries by artist.
pub fn artist_field(prefer_album_artist: bool) -> &'static str {
    if prefer_album_artist {
        ALBUM_ARTIST_FIELD
    } else {
        ARTIST_FIELD
    }
}

/// One `FIELD IS "value"` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub value: String,
}

/// Conjunction of exact-match clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpression {
    clauses: Vec<Clause>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field IS "value"` clause.
    pub fn is(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Every track of `album` credited to `artist`.
    pub fn album_scope(artist: &str, album: &str, prefer_album_artist: bool) -> Self {
        Self::new()
            .is(artist_field(prefer_album_artist), artist)
            .is(ALBUM_FIELD, album)
    }

    /// Every track credited to `artist`.
    pub fn artist_scope(artist: &str, prefer_album_artist: bool) -> Self {
        Self::new().is(artist_field(prefer_album_artist), artist)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the expression with `eval` resolving a field to its value.
    ///
    /// An empty expression matches everything.
    pub fn matches<F>(&self, mut eval: F) -> bool
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.clauses
            .iter()
            .all(|clause| eval(&clause.field).as_deref() == Some(clause.value.as_str()))
    }

    /// Parse an expression produced by [`Display`](fmt::Display).
    ///
    /// `IS` and `AND` are case-insensitive. Inside a quoted value only `\\`
    /// and `\"` are recognized escapes.
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, clause) in self.clauses.iter().enumerate() {
            if index > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{} IS {}", clause.field, quote(&clause.value))?;
        }
        Ok(())
    }
}

/// Quote a value for embedding in a filter expression.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<FilterExpression> {
        let mut expression = FilterExpression::new();

        self.skip_whitespace();
        if self.at_end() {
            return Err(self.error("empty expression"));
        }

        loop {
            let field = self.word().ok_or_else(|| self.error("expected field"))?;
            self.keyword("IS")?;
            let value = self.quoted()?;
            expression.clauses.push(Clause {
                field: field.to_string(),
                value,
            });

            self.skip_whitespace();
            if self.at_end() {
                return Ok(expression);
            }
            self.keyword("AND")?;
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '"')
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn keyword(&mut self, expected: &str) -> Result<()> {
        let start = self.pos;
        match self.word() {
            Some(word) if word.eq_ignore_ascii_case(expected) => Ok(()),
            _ => {
                self.pos = start;
                self.skip_whitespace();
                Err(self.error(&format!("expected {expected}")))
            }
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.skip_whitespace();
        let mut chars = self.rest().char_indices();
        match chars.next() {
            Some((_, '"')) => {}
            _ => return Err(self.error("expected quoted value")),
        }

        let mut value = String::new();
        let mut escaped = false;
        for (offset, c) in chars {
            if escaped {
                match c {
                    '\\' | '"' => value.push(c),
                    _ => {
                        self.pos += offset;
                        return Err(self.error("invalid escape"));
                    }
                }
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                self.pos += offset + 1;
                return Ok(value);
            } else {
                value.push(c);
            }
        }

        Err(self.error("unterminated quoted value"))
    }

    fn error(&self, message: &str) -> LibraryError {
        LibraryError::InvalidFilter {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}
