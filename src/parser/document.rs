use super::*;

/// Leading whitespace of a line.
#[derive(Debug, Clone, Copy, Default)]
struct IndentRun {
    width: usize,
    spaces: bool,
    tabs: bool,
}

pub(super) fn parse_module(parser: &mut Parser) -> Result<(), PaircError> {
    while !parser.stream.is_eof() {
        parse_line(parser)?;
    }
    finish_module(parser);
    debug!(
        file = %parser.stream.name(),
        pairs = parser.tree.descendants(parser.module).len(),
        "parsed module"
    );
    Ok(())
}

fn parse_line(parser: &mut Parser) -> Result<(), PaircError> {
    parser.line = LineState::default();

    let indent_start = parser.pos();
    let indent = read_indent(parser);
    let indent_span = Span::new(indent_start, parser.pos());
    parser.line.width = indent.width;

    if parser.at_eol() {
        parser.consume_eol();
        return Ok(());
    }

    // Comments never take part in the indentation structure.
    if parser.at_comment() {
        let parent = comment_parent(parser, indent.width);
        comment::parse_comments(parser, parent)?;
        if parser.at_eol() {
            parser.consume_eol();
            return Ok(());
        }
    }

    let Some(depth) = measure_depth(parser, indent, indent_span)? else {
        parser.skip_to_eol();
        parser.consume_eol();
        return Ok(());
    };
    parser.line.depth = depth;
    trace!(line = indent_start.line, depth, "line");

    parser.blocks.truncate(depth + 1);
    let mut parent = parser.blocks[depth];
    if depth > 0 && !parser.tree.accepts_children(parent) {
        let p = &parser.tree[parent];
        let (kind, name) = (p.kind.name(), p.qualified_name());
        let span = Span::new(indent_start, parser.pos());
        parser.report(ErrorCode::BlockIsNotExpected, &[kind, &name], span)?;
        parent = parser.orphan();
        parser.blocks[depth] = parent;
    }

    parser.line.sub_state = SubState::PairDelimiter;
    let candidate = parse_pairs(parser, parent)?;
    parser.skip_to_eol();
    parser.consume_eol();

    if let Some(candidate) = candidate {
        parser.blocks.push(candidate);
    }
    Ok(())
}

fn read_indent(parser: &mut Parser) -> IndentRun {
    let mut run = IndentRun::default();
    loop {
        match parser.peek() {
            Some(' ') => run.spaces = true,
            Some('\t') => run.tabs = true,
            _ => break,
        }
        parser.bump();
        run.width += 1;
    }
    run
}

/// Depth for a comment line; comments are attached leniently.
fn comment_parent(parser: &Parser, width: usize) -> NodeId {
    let depth = match parser.indent_unit {
        Some(unit) => width / unit.width,
        None if width > 0 => 1,
        None => 0,
    };
    parser.blocks[depth.min(parser.blocks.len() - 1)]
}

/// Validates the indentation of a content line. Returns `None` after
/// reporting when the line has to be skipped.
fn measure_depth(
    parser: &mut Parser,
    indent: IndentRun,
    span: Span,
) -> Result<Option<usize>, PaircError> {
    if indent.width == 0 {
        return Ok(Some(0));
    }
    if indent.spaces && indent.tabs {
        parser.report(ErrorCode::MixedIndentation, &[], span)?;
        return Ok(None);
    }
    let ch = if indent.tabs { '\t' } else { ' ' };
    let open = parser.blocks.len() - 1;

    let unit = match parser.indent_unit {
        Some(unit) => unit,
        None => {
            if open == 0 {
                parser.report(ErrorCode::InvalidIndentation, &[], span)?;
                return Ok(None);
            }
            // The first indented line fixes the unit for the whole module.
            let unit = IndentUnit {
                ch,
                width: indent.width,
            };
            debug!(width = unit.width, tabs = indent.tabs, "indent unit established");
            parser.indent_unit = Some(unit);
            return Ok(Some(1));
        }
    };

    if unit.ch != ch {
        parser.report(ErrorCode::MixedIndentation, &[], span)?;
        return Ok(None);
    }
    if indent.width % unit.width != 0 {
        let (width, unit_width) = (indent.width.to_string(), unit.width.to_string());
        parser.report(ErrorCode::InvalidIndentMultiplicity, &[&width, &unit_width], span)?;
        return Ok(None);
    }
    let depth = indent.width / unit.width;
    if depth > open {
        parser.report(ErrorCode::InvalidIndentation, &[], span)?;
        return Ok(None);
    }
    Ok(Some(depth))
}

/// Checks the leading whitespace of a continuation line without consuming
/// it. Continuation lines keep the depth of their pair, but their indent
/// characters obey the same rules as any other line.
pub(super) fn check_continuation_indent(parser: &mut Parser) -> Result<(), PaircError> {
    let start = parser.pos();
    let mut run = IndentRun::default();
    let mut k = 1;
    loop {
        match parser.la(k) {
            Some(' ') => run.spaces = true,
            Some('\t') => run.tabs = true,
            _ => break,
        }
        run.width += 1;
        k += 1;
    }
    if run.width == 0 || matches!(parser.la(k), None | Some('\n' | '\r')) {
        return Ok(());
    }

    let ch = if run.tabs { '\t' } else { ' ' };
    let foreign = parser.indent_unit.is_some_and(|unit| unit.ch != ch);
    if (run.spaces && run.tabs) || foreign {
        let end = Position {
            line: start.line,
            column: start.column + run.width,
            offset: start.offset + run.width,
        };
        parser.report(ErrorCode::MixedIndentation, &[], Span::new(start, end))?;
    }
    Ok(())
}

/// Parses the pairs of one line under `parent`.
///
/// `levels` is the chain of containers for the next pair on the line: a
/// block pair (`a: b: c`) pushes itself, `,` returns to the last pair's
/// parent and `( ... )` groups pairs under the pair before them. Returns the
/// container for a deeper next line.
fn parse_pairs(parser: &mut Parser, parent: NodeId) -> Result<Option<NodeId>, PaircError> {
    let mut levels: Vec<NodeId> = vec![parent];
    // levels length when each open group started, and where it started
    let mut groups: Vec<(usize, Position)> = Vec::new();
    let mut last_len = 1;

    loop {
        parser.skip_blanks();
        if parser.at_eol() {
            break;
        }
        if parser.at_comment() {
            let target = levels.last().copied().unwrap_or(parent);
            comment::parse_comments(parser, target)?;
            continue;
        }

        let Some(c) = parser.peek() else { break };
        match c {
            ',' => {
                parser.bump();
                if parser.line.chaining_started {
                    let floor = groups.last().map_or(1, |g| g.0);
                    levels.truncate(last_len.max(floor));
                }
                parser.line.sub_state = SubState::PairDelimiter;
            }
            ')' if !groups.is_empty() => {
                parser.bump();
                if let Some((len, _)) = groups.pop() {
                    levels.truncate(len);
                    last_len = len.saturating_sub(1).max(1);
                }
                parser.line.inline = !groups.is_empty();
                if parser.line.chaining_started && levels.len() > 1 {
                    parser.line.current_pair = levels.last().copied();
                }
                parser.line.sub_state = SubState::Value;
            }
            '(' if !parser.line.expects_separator() => {
                let open = parser.pos();
                parser.bump();
                groups.push((levels.len(), open));
                parser.line.inline = true;
                parser.line.sub_state = SubState::PairDelimiter;
            }
            _ if parser.line.expects_separator() || c == ')' || c == '(' => {
                let span = Span::point(parser.pos());
                parser.report(ErrorCode::UnexpectedCharacter, &[&c.to_string()], span)?;
                parser.skip_to_eol();
                break;
            }
            _ => {
                let container = levels.last().copied().unwrap_or(parent);
                let Some(pair) = parse_pair(parser, container)? else {
                    parser.skip_to_eol();
                    break;
                };
                last_len = levels.len();
                parser.line.current_pair = Some(pair);

                let delimiter = parser.tree[pair].delimiter;
                if delimiter.is_block() {
                    levels.push(pair);
                    parser.line.chaining_started = true;
                    parser.line.sub_state = SubState::PairDelimiter;
                } else if delimiter.is_value() {
                    parser.line.sub_state = SubState::Value;
                } else {
                    parser.skip_blanks();
                    if parser.peek() == Some('(') {
                        levels.push(pair);
                        parser.line.chaining_started = true;
                        parser.line.sub_state = SubState::PairDelimiter;
                    } else {
                        parser.line.sub_state = SubState::Value;
                    }
                }
            }
        }
    }

    for (_, open) in groups.drain(..).rev() {
        parser.report(ErrorCode::MissingClosingParenthesis, &[], Span::point(open))?;
    }
    parser.line.inline = false;
    Ok(parser.line.current_pair)
}

fn parse_pair(parser: &mut Parser, parent: NodeId) -> Result<Option<NodeId>, PaircError> {
    let start = parser.pos();
    let sigil = name::parse_sigil(parser);
    let name = name::parse_name(parser)?;
    parser.skip_blanks();
    let delimiter = name::parse_delimiter(parser);

    if sigil == Sigil::None && name.is_none() && delimiter == DelimiterKind::None {
        let c = parser.peek().map(String::from).unwrap_or_default();
        parser.report(ErrorCode::UnexpectedCharacter, &[&c], Span::point(start))?;
        return Ok(None);
    }

    let ctx = parser.context(
        sigil,
        name.as_ref(),
        delimiter,
        Span::new(start, parser.pos()),
        parent,
    );
    let pair = parser.create(&ctx);
    parser.attach(parent, pair)?;

    match delimiter {
        DelimiterKind::Equal => value::parse_value(parser, pair)?,
        DelimiterKind::DoubleEqual => value::parse_free_string(parser, pair)?,
        _ => {}
    }
    let end = parser.pos();
    parser.tree[pair].span.end = end;
    Ok(Some(pair))
}

/// Post-parse normalization: `:=` children become interpolation items and
/// bare pairs holding content become objects.
fn finish_module(parser: &mut Parser) {
    for id in parser.tree.descendants(parser.module) {
        let pair = &parser.tree[id];
        if pair.delimiter == DelimiterKind::ColonEqual && pair.interpolation_items.is_none() {
            let children = parser.tree.take_children(id);
            let (comments, items): (Vec<NodeId>, Vec<NodeId>) = children
                .into_iter()
                .partition(|c| parser.tree[*c].kind.is_comment());
            for item in &items {
                if let PairKind::Parameter { position, .. } = &mut parser.tree[*item].kind {
                    *position = ParameterPosition::Value;
                }
            }
            parser.tree.adopt_children(id, comments);
            parser.tree.set_interpolation_items(id, items);
            parser.tree[id].value_kind = ValueKind::Concatenation;
        } else if pair.delimiter == DelimiterKind::None
            && pair.value_kind == ValueKind::None
            && !matches!(pair.kind, PairKind::Module { .. })
            && parser.tree.content_children(id).next().is_some()
        {
            parser.tree[id].value_kind = ValueKind::Object;
        }
    }
}
