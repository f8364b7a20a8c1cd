// Author: Dustin Pilgrim
// License: MIT

//! Character stream with line/column tracking.
//!
//! The parser never tokenizes; every decision it makes is a lookahead on this
//! stream, so the column numbers reported in diagnostics come straight from
//! here. Lines and columns are 1-based, offsets are 0-based character indices.

use std::rc::Rc;

use thiserror::Error;

use crate::ast::Position;

mod scanner;

/// Value returned by [`CharStream::next`] once the input is exhausted.
pub const EOF: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("[PAIRC] Unexpected end of input at {line}:{column}")]
    EndOfInput { line: usize, column: usize },
}

pub struct CharStream {
    name: Rc<str>,
    data: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl CharStream {
    pub fn new(name: impl Into<Rc<str>>, input: &str) -> Self {
        CharStream {
            name: name.into(),
            data: input.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    /// Builds a stream from UTF-16 code units. A surrogate pair becomes one
    /// logical character; an unpaired surrogate is replaced by U+FFFD.
    pub fn from_utf16(name: impl Into<Rc<str>>, units: &[u16]) -> Self {
        let data = char::decode_utf16(units.iter().copied())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        CharStream {
            name: name.into(),
            data,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.data.len()
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.index,
        }
    }

    /// The character about to be consumed as a code point, or [`EOF`].
    pub fn next(&self) -> i32 {
        self.peek().map_or(EOF, |c| c as i32)
    }

    /// The character about to be consumed.
    pub fn peek(&self) -> Option<char> {
        self.data.get(self.index).copied()
    }

    /// Lookahead. `la(1)` is the next character, `la(-1)` the last consumed
    /// one. `la(0)` is undefined and always yields `None`.
    pub fn la(&self, i: isize) -> Option<char> {
        scanner::lookahead(self, i)
    }

    /// Advances by one logical character and returns it. A `"\r\n"` pair is
    /// consumed as a single `'\n'`.
    pub fn consume(&mut self) -> Result<char, StreamError> {
        scanner::consume(self)
    }

    /// Extracts the characters in `[start, end)` as a string.
    pub fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.data.len());
        if start >= end {
            return String::new();
        }
        self.data[start..end].iter().collect()
    }
}

#[cfg(test)]
mod tests;
