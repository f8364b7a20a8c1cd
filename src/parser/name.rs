// Author: Dustin Pilgrim
// License: MIT

use super::factory::Sigil;
use super::{value, Parser, SubState, NAME_BOUNDARIES};
use crate::ast::{DelimiterKind, Span};
use crate::diagnostics::ErrorCode;
use crate::error::PaircError;

/// A pair name as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    pub text: String,
    /// The quote character for quoted names; quoted names are never split.
    pub quoted: Option<char>,
    pub span: Span,
}

pub(super) fn parse_sigil(parser: &mut Parser) -> Sigil {
    let (sigil, width) = match (parser.la(1), parser.la(2)) {
        (Some('!'), Some('$')) => (Sigil::AliasDefinition, 2),
        (Some('!'), Some('#')) => (Sigil::NamespaceDefinition, 2),
        (Some('!'), Some('%')) => (Sigil::Parameter, 2),
        (Some('!'), _) => (Sigil::Document, 1),
        (Some('$'), _) => (Sigil::Alias, 1),
        (Some('%'), _) => (Sigil::Percent, 1),
        (Some('#'), _) => (Sigil::Scope, 1),
        (Some('@'), _) => (Sigil::Attribute, 1),
        _ => return Sigil::None,
    };
    for _ in 0..width {
        parser.bump();
    }
    sigil
}

pub(super) fn parse_name(parser: &mut Parser) -> Result<Option<NameToken>, PaircError> {
    parser.line.sub_state = SubState::Name;
    if parser.at_comment() {
        return Ok(None);
    }

    match parser.peek() {
        Some(q @ ('\'' | '"')) => parse_quoted_name(parser, q).map(Some),
        _ => Ok(parse_bare_name(parser)),
    }
}

fn parse_bare_name(parser: &mut Parser) -> Option<NameToken> {
    let start = parser.pos();
    let mut text = String::new();
    let mut end = start;

    while let Some(c) = parser.peek() {
        if c == '\r' || NAME_BOUNDARIES.contains(&c) || parser.at_comment() {
            break;
        }
        parser.bump();
        text.push(c);
        if !c.is_whitespace() {
            end = parser.pos();
        }
    }

    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return None;
    }
    Some(NameToken {
        text: trimmed.to_string(),
        quoted: None,
        span: Span::new(start, end),
    })
}

fn parse_quoted_name(parser: &mut Parser, quote: char) -> Result<NameToken, PaircError> {
    let start = parser.pos();
    parser.bump();
    let mut text = String::new();

    loop {
        if parser.at_eol() {
            let span = Span::new(start, parser.pos());
            parser.report(ErrorCode::MissingClosingQuote, &["quote"], span)?;
            break;
        }
        match parser.peek() {
            Some(c) if c == quote => {
                parser.bump();
                break;
            }
            Some('\\') if quote == '"' => value::read_escape(parser, &mut text)?,
            Some(c) => {
                parser.bump();
                text.push(c);
            }
            None => break,
        }
    }

    Ok(NameToken {
        text,
        quoted: Some(quote),
        span: Span::new(start, parser.pos()),
    })
}

pub(super) fn parse_delimiter(parser: &mut Parser) -> DelimiterKind {
    parser.line.sub_state = SubState::Delimiter;
    let (delimiter, width) = match (parser.la(1), parser.la(2)) {
        (Some('='), Some('=')) => (DelimiterKind::DoubleEqual, 2),
        (Some('='), Some(':')) => (DelimiterKind::EqualColon, 2),
        (Some('='), _) => (DelimiterKind::Equal, 1),
        (Some(':'), Some(':')) => (DelimiterKind::DoubleColon, 2),
        (Some(':'), Some('=')) => (DelimiterKind::ColonEqual, 2),
        (Some(':'), _) => (DelimiterKind::Colon, 1),
        _ => return DelimiterKind::None,
    };
    for _ in 0..width {
        parser.bump();
    }
    delimiter
}
