// Author: Dustin Pilgrim
// License: MIT

use super::Parser;
use crate::ast::{NodeId, Pair, PairKind, Span, ValueKind};
use crate::diagnostics::ErrorCode;
use crate::error::PaircError;

/// Parses consecutive comments and attaches them to `parent`.
pub(super) fn parse_comments(parser: &mut Parser, parent: NodeId) -> Result<(), PaircError> {
    while parser.at_comment() {
        let comment = parse_comment(parser)?;
        parser.tree.append_child(parent, comment)?;
        parser.skip_blanks();
    }
    Ok(())
}

/// `'''` runs to the end of the line; `"""` runs to the next `"""` and may
/// span lines.
fn parse_comment(parser: &mut Parser) -> Result<NodeId, PaircError> {
    let start = parser.pos();
    let quote = parser.peek().unwrap_or('\'');
    for _ in 0..3 {
        parser.bump();
    }

    let mut text = String::new();
    if quote == '\'' {
        while !parser.at_eol() {
            if let Some(c) = parser.bump() {
                text.push(c);
            }
        }
    } else {
        loop {
            if parser.la(1) == Some('"') && parser.la(2) == Some('"') && parser.la(3) == Some('"') {
                for _ in 0..3 {
                    parser.bump();
                }
                break;
            }
            match parser.bump() {
                Some(c) => text.push(c),
                None => {
                    let span = Span::new(start, parser.pos());
                    parser.report(ErrorCode::MissingClosingQuote, &["comment"], span)?;
                    break;
                }
            }
        }
    }

    let span = Span::new(start, parser.pos());
    let pair = Pair::new(
        PairKind::Comment,
        span,
        parser.stream.name().clone(),
        parser.file_index,
    )
    .with_value(text.trim().to_string(), ValueKind::OpenString);
    Ok(parser.tree.add(pair))
}
