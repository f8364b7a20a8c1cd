// Author: Dustin Pilgrim
// License: MIT

use super::factory::Sigil;
use super::name::NameToken;
use super::document::check_continuation_indent;
use super::{Parser, SubState};
use crate::ast::{DelimiterKind, NodeId, Pair, PairKind, Position, Span, ValueKind};
use crate::diagnostics::ErrorCode;
use crate::error::PaircError;

/// How continuation lines are joined onto a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Open strings: lines are trimmed and joined with a space.
    Fold,
    /// Free strings: kept verbatim past the first line's indentation,
    /// joined with a newline.
    Verbatim,
}

enum Segment {
    Text(String, Span),
    Reference(NodeId),
}

/// Parses whatever follows `=`.
pub(super) fn parse_value(parser: &mut Parser, owner: NodeId) -> Result<(), PaircError> {
    parser.line.sub_state = SubState::Value;
    parser.skip_blanks();

    if parser.at_eol() {
        match read_continuation(parser, Continuation::Fold)? {
            Some(text) => set_value(parser, owner, text, ValueKind::FoldedOpenString),
            None => set_value(parser, owner, String::new(), ValueKind::Empty),
        }
        return Ok(());
    }
    if parser.at_comment() {
        set_value(parser, owner, String::new(), ValueKind::Empty);
        return Ok(());
    }

    match parser.peek() {
        Some(q @ ('\'' | '"')) => read_quoted(parser, owner, q),
        Some('$' | '%') if reference_ahead(parser) => {
            let reference = read_reference(parser, owner);
            parser.tree.set_value_reference(owner, reference);
            Ok(())
        }
        _ => read_open_string(parser, owner),
    }
}

/// Parses whatever follows `==`: the rest of the line, verbatim.
pub(super) fn parse_free_string(parser: &mut Parser, owner: NodeId) -> Result<(), PaircError> {
    parser.line.sub_state = SubState::Value;
    parser.skip_blanks();

    let mut text = read_rest_of_line(parser).trim_end().to_string();
    if let Some(more) = read_continuation(parser, Continuation::Verbatim)? {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&more);
    }

    let kind = if text.is_empty() {
        ValueKind::Empty
    } else {
        ValueKind::OpenString
    };
    set_value(parser, owner, text, kind);
    Ok(())
}

fn read_open_string(parser: &mut Parser, owner: NodeId) -> Result<(), PaircError> {
    let mut text = String::new();
    loop {
        match parser.peek() {
            None | Some('\n' | '\r' | ',') => break,
            Some(')') if parser.line.inline => break,
            Some(_) if parser.at_comment() => break,
            Some(c) => {
                parser.bump();
                text.push(c);
            }
        }
    }
    let text = text.trim_end().to_string();

    if parser.at_eol() {
        if let Some(more) = read_continuation(parser, Continuation::Fold)? {
            let folded = format!("{} {}", text, more);
            set_value(parser, owner, folded, ValueKind::FoldedOpenString);
            return Ok(());
        }
    }

    let kind = if text.is_empty() {
        ValueKind::Empty
    } else {
        parser.factory.open_value_kind(&text)
    };
    set_value(parser, owner, text, kind);
    Ok(())
}

fn read_rest_of_line(parser: &mut Parser) -> String {
    let mut line = String::new();
    while !parser.at_eol() {
        if let Some(c) = parser.bump() {
            line.push(c);
        }
    }
    line
}

/// Consumes the following lines indented deeper than the current line and
/// returns them joined. The stream is left at the end of the last one.
fn read_continuation(parser: &mut Parser, mode: Continuation) -> Result<Option<String>, PaircError> {
    let base = parser.line.width;
    let mut lines: Vec<String> = Vec::new();
    let mut strip: Option<usize> = None;

    while let Some((width, blank)) = parser.peek_next_line() {
        if blank || width <= base {
            break;
        }
        parser.line.sub_state = SubState::IndentMls;
        parser.consume_eol();
        check_continuation_indent(parser)?;

        let strip_width = *strip.get_or_insert(width);
        let mut skipped = 0;
        while skipped < strip_width && matches!(parser.peek(), Some(' ' | '\t')) {
            parser.bump();
            skipped += 1;
        }

        let line = read_rest_of_line(parser);
        lines.push(match mode {
            Continuation::Fold => line.trim().to_string(),
            Continuation::Verbatim => line.trim_end().to_string(),
        });
    }

    if lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(match mode {
        Continuation::Fold => lines.join(" "),
        Continuation::Verbatim => lines.join("\n"),
    }))
}

/// Quoted value, possibly spanning lines. Double quotes process escapes and
/// `$alias` / `%param` interpolation.
fn read_quoted(parser: &mut Parser, owner: NodeId, quote: char) -> Result<(), PaircError> {
    let open = parser.pos();
    let open_column = parser.stream.column();
    parser.bump();

    let mut segments: Vec<Segment> = Vec::new();
    let mut literal = String::new();
    let mut literal_start = parser.pos();

    loop {
        match parser.peek() {
            None => {
                let span = Span::new(open, parser.pos());
                parser.report(ErrorCode::MissingClosingQuote, &["quote"], span)?;
                break;
            }
            Some(c) if c == quote => {
                parser.bump();
                break;
            }
            Some('\n' | '\r') => {
                let continues = matches!(
                    parser.peek_next_line(),
                    Some((width, blank)) if blank || width > parser.line.width
                );
                if !continues {
                    let span = Span::new(open, parser.pos());
                    parser.report(ErrorCode::MissingClosingQuote, &["quote"], span)?;
                    break;
                }
                parser.line.sub_state = SubState::IndentMls;
                parser.consume_eol();
                check_continuation_indent(parser)?;
                while matches!(parser.peek(), Some(' ' | '\t')) && parser.stream.column() <= open_column
                {
                    parser.bump();
                }
                literal.push('\n');
            }
            Some('\\') if quote == '"' => read_escape(parser, &mut literal)?,
            Some('$' | '%') if quote == '"' && parser.la(2).is_some_and(is_reference_char) => {
                if !literal.is_empty() {
                    let span = Span::new(literal_start, parser.pos());
                    segments.push(Segment::Text(std::mem::take(&mut literal), span));
                }
                let reference = read_reference(parser, owner);
                segments.push(Segment::Reference(reference));
                literal_start = parser.pos();
            }
            Some(c) => {
                parser.bump();
                literal.push(c);
            }
        }
    }

    let kind = if quote == '"' {
        ValueKind::DoubleQuoted
    } else {
        ValueKind::SingleQuoted
    };

    if segments.is_empty() {
        set_value(parser, owner, literal, kind);
        return Ok(());
    }

    if !literal.is_empty() {
        let span = Span::new(literal_start, parser.pos());
        segments.push(Segment::Text(literal, span));
    }
    let items = segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Reference(id) => id,
            Segment::Text(text, span) => {
                let pair = Pair::new(
                    PairKind::Element,
                    span,
                    parser.stream.name().clone(),
                    parser.file_index,
                )
                .with_value(text, ValueKind::DoubleQuoted);
                parser.tree.add(pair)
            }
        })
        .collect();
    parser.tree.set_interpolation_items(owner, items);
    parser.tree[owner].value_kind = ValueKind::Concatenation;
    Ok(())
}

fn is_reference_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// A `$alias` or `%param` that makes up the whole value.
fn reference_ahead(parser: &Parser) -> bool {
    let sigil = parser.la(1);
    let mut k = 2;
    while parser.la(k).is_some_and(is_reference_char) {
        k += 1;
    }
    if sigil == Some('$') && k == 2 {
        return false;
    }
    while matches!(parser.la(k), Some(' ' | '\t')) {
        k += 1;
    }
    match parser.la(k) {
        None | Some('\n' | '\r' | ',') => true,
        Some(')') => parser.line.inline,
        Some(q @ ('\'' | '"')) => parser.la(k + 1) == Some(q) && parser.la(k + 2) == Some(q),
        _ => false,
    }
}

/// Reads `$name` / `%name` (or a bare `%`) and creates its node under `owner`.
fn read_reference(parser: &mut Parser, owner: NodeId) -> NodeId {
    let start = parser.pos();
    let sigil = match parser.bump() {
        Some('$') => Sigil::Alias,
        _ => Sigil::Percent,
    };

    let name_start = parser.pos();
    let mut text = String::new();
    while let Some(c) = parser.peek().filter(|c| is_reference_char(*c)) {
        // a trailing dot ends the sentence, not the name
        if c == '.' && !parser.la(2).is_some_and(|n| n != '.' && is_reference_char(n)) {
            break;
        }
        parser.bump();
        text.push(c);
    }
    let name = (!text.is_empty()).then(|| NameToken {
        text,
        quoted: None,
        span: Span::new(name_start, parser.pos()),
    });

    let mut ctx = parser.context(
        sigil,
        name.as_ref(),
        DelimiterKind::None,
        Span::new(start, parser.pos()),
        owner,
    );
    ctx.value_position = true;
    parser.create(&ctx)
}

/// Decodes one backslash escape into `out`. Unknown escapes are reported and
/// kept as written.
pub(super) fn read_escape(parser: &mut Parser, out: &mut String) -> Result<(), PaircError> {
    let start = parser.pos();
    parser.bump();

    let simple = match parser.peek() {
        Some('\\') => Some('\\'),
        Some('"') => Some('"'),
        Some('\'') => Some('\''),
        Some('/') => Some('/'),
        Some('b') => Some('\u{8}'),
        Some('f') => Some('\u{c}'),
        Some('n') => Some('\n'),
        Some('r') => Some('\r'),
        Some('t') => Some('\t'),
        Some('$') => Some('$'),
        Some('%') => Some('%'),
        _ => None,
    };
    if let Some(c) = simple {
        parser.bump();
        out.push(c);
        return Ok(());
    }

    match parser.peek() {
        Some('u') => read_unicode_escape(parser, start, out),
        Some(c) if c != '\n' && c != '\r' => {
            parser.bump();
            let sequence = format!("\\{}", c);
            let span = Span::new(start, parser.pos());
            parser.report(ErrorCode::InvalidEscapeSequence, &[&sequence], span)?;
            out.push_str(&sequence);
            Ok(())
        }
        _ => {
            let span = Span::new(start, parser.pos());
            parser.report(ErrorCode::InvalidEscapeSequence, &["\\"], span)?;
            out.push('\\');
            Ok(())
        }
    }
}

fn read_unicode_escape(
    parser: &mut Parser,
    start: Position,
    out: &mut String,
) -> Result<(), PaircError> {
    parser.bump();

    let Some(unit) = hex4_at(parser, 1) else {
        let span = Span::new(start, parser.pos());
        parser.report(ErrorCode::InvalidEscapeSequence, &["\\u"], span)?;
        out.push_str("\\u");
        return Ok(());
    };
    for _ in 0..4 {
        parser.bump();
    }

    if (0xD800..0xDC00).contains(&unit) {
        let low = if parser.la(1) == Some('\\') && parser.la(2) == Some('u') {
            hex4_at(parser, 3).filter(|l| (0xDC00..0xE000).contains(l))
        } else {
            None
        };
        if let Some(low) = low {
            for _ in 0..6 {
                parser.bump();
            }
            let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            return Ok(());
        }
    }

    match char::from_u32(unit) {
        Some(c) => out.push(c),
        None => {
            let sequence = format!("\\u{:04X}", unit);
            let span = Span::new(start, parser.pos());
            parser.report(ErrorCode::InvalidEscapeSequence, &[&sequence], span)?;
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
    Ok(())
}

/// Value of the four hex digits at lookahead `k..k+4`.
fn hex4_at(parser: &Parser, k: isize) -> Option<u32> {
    (k..k + 4).try_fold(0u32, |acc, i| {
        let digit = parser.la(i)?.to_digit(16)?;
        Some(acc * 16 + digit)
    })
}

fn set_value(parser: &mut Parser, owner: NodeId, text: String, kind: ValueKind) {
    let pair = &mut parser.tree[owner];
    pair.value = Some(text);
    pair.value_kind = kind;
}
