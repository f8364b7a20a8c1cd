// Author: Dustin Pilgrim
// License: MIT

//! Indentation-sensitive parser.
//!
//! There is no token pass: the parser reads characters straight from a
//! [`CharStream`] and builds pairs line by line. Indentation decides nesting,
//! delimiters decide whether a value or a block follows, and sigils handed to
//! the [`NodeFactory`] decide which kind of pair gets created.

use std::path::Path;

use tracing::{debug, trace};

use crate::ast::{
    CompileUnit, DelimiterKind, NodeId, Pair, PairKind, PairTree, ParameterPosition, Position,
    Span, TargetFormat, ValueKind,
};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorListener, ErrorOrigin};
use crate::error::{PaircError, StructuralFault};
use crate::stream::CharStream;

mod comment;
mod document;
mod factory;
mod name;
mod value;

pub use factory::{factory_for, JsonNodeFactory, NodeContext, NodeFactory, Sigil, XmlNodeFactory};
pub use name::NameToken;

/// Characters that end a bare name.
pub const NAME_BOUNDARIES: [char; 8] = ['=', ':', ',', '\'', '"', ')', '(', '\n'];

/// Position of the parser inside the current line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubState {
    #[default]
    Indent,
    PairDelimiter,
    Name,
    Delimiter,
    Value,
    /// Inside a multi-line string; indentation is measured against the
    /// string's opening column instead of the block.
    IndentMls,
}

/// Per-line state, reset at each physical line.
#[derive(Debug, Clone, Default)]
pub struct LineState {
    /// Indentation width in characters.
    pub width: usize,
    pub depth: usize,
    pub sub_state: SubState,
    pub chaining_started: bool,
    pub current_pair: Option<NodeId>,
    /// Inside an inline `( ... )` group.
    pub inline: bool,
}

impl LineState {
    /// The last pair's value is complete; only `,`, `)` or a comment may
    /// follow on the line.
    pub fn expects_separator(&self) -> bool {
        self.sub_state == SubState::Value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndentUnit {
    ch: char,
    width: usize,
}

pub struct Parser<'a> {
    stream: CharStream,
    tree: &'a mut PairTree,
    listener: &'a mut dyn ErrorListener,
    factory: Box<dyn NodeFactory>,
    module: NodeId,
    file_index: usize,
    indent_unit: Option<IndentUnit>,
    /// `blocks[d]` receives the pairs of the next line at depth `d`.
    blocks: Vec<NodeId>,
    line: LineState,
}

/// Parses one input into a new module of `unit` and returns the module id.
///
/// Diagnostics go to `listener`; only fatal conditions are returned as errors.
pub fn parse_module(
    unit: &mut CompileUnit,
    file_name: &str,
    input: &str,
    format: TargetFormat,
    listener: &mut dyn ErrorListener,
) -> Result<NodeId, PaircError> {
    let module = unit.add_module(file_name, format);
    let stream = CharStream::new(file_name, input);
    let mut parser = Parser::new(stream, &mut unit.tree, module, factory_for(format), listener);
    debug!(file = file_name, format = format.as_str(), "parsing module");
    parser.parse()?;
    Ok(module)
}

impl<'a> Parser<'a> {
    pub fn new(
        stream: CharStream,
        tree: &'a mut PairTree,
        module: NodeId,
        factory: Box<dyn NodeFactory>,
        listener: &'a mut dyn ErrorListener,
    ) -> Self {
        let file_index = tree[module].file_index;
        Parser {
            stream,
            tree,
            listener,
            factory,
            module,
            file_index,
            indent_unit: None,
            blocks: vec![module],
            line: LineState::default(),
        }
    }

    pub fn parse(&mut self) -> Result<(), PaircError> {
        document::parse_module(self)
    }

    pub(crate) fn report(&mut self, code: ErrorCode, args: &[&str], span: Span) -> Result<(), PaircError> {
        trace!(code = code.as_str(), line = span.start.line, "parse diagnostic");
        let diagnostic = Diagnostic::new(
            code,
            args,
            self.stream.name(),
            self.file_index,
            span,
            ErrorOrigin::Parse,
        );
        self.listener.on_error(&diagnostic)
    }

    pub(crate) fn pos(&self) -> Position {
        self.stream.position()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.stream.peek()
    }

    pub(crate) fn la(&self, i: isize) -> Option<char> {
        self.stream.la(i)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        self.stream.consume().ok()
    }

    pub(crate) fn at_eol(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r'))
    }

    pub(crate) fn at_comment(&self) -> bool {
        match self.la(1) {
            Some(q @ ('\'' | '"')) => self.la(2) == Some(q) && self.la(3) == Some(q),
            _ => false,
        }
    }

    pub(crate) fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    pub(crate) fn skip_to_eol(&mut self) {
        while !self.at_eol() {
            self.bump();
        }
    }

    pub(crate) fn consume_eol(&mut self) {
        if matches!(self.peek(), Some('\n') | Some('\r')) {
            self.bump();
        }
    }

    /// Width of the leading whitespace of the line after the current line
    /// break, and whether that line is blank. `None` when no line follows.
    pub(crate) fn peek_next_line(&self) -> Option<(usize, bool)> {
        let mut k = 1;
        if self.la(k) == Some('\r') {
            k += 1;
        }
        if self.la(k) == Some('\n') {
            k += 1;
        } else if k == 1 {
            return None;
        }
        let mut width = 0;
        while matches!(self.la(k), Some(' ') | Some('\t')) {
            width += 1;
            k += 1;
        }
        let blank = matches!(self.la(k), None | Some('\n') | Some('\r'));
        Some((width, blank))
    }

    pub(crate) fn create(&mut self, ctx: &NodeContext<'_>) -> NodeId {
        let pair = self.factory.create_pair(ctx, self.tree);
        self.tree.add(pair)
    }

    pub(crate) fn context<'n>(
        &self,
        sigil: Sigil,
        name: Option<&'n NameToken>,
        delimiter: DelimiterKind,
        span: Span,
        parent: NodeId,
    ) -> NodeContext<'n> {
        NodeContext {
            sigil,
            name,
            delimiter,
            span,
            parent,
            value_position: false,
            inline_argument: self.line.inline
                && matches!(self.tree[parent].kind, PairKind::Alias { .. }),
            file_name: self.stream.name().clone(),
            file_index: self.file_index,
        }
    }

    /// A detached element that absorbs content which has no valid parent.
    pub(crate) fn orphan(&mut self) -> NodeId {
        let pair = Pair::new(
            PairKind::Element,
            Span::point(self.pos()),
            self.stream.name().clone(),
            self.file_index,
        );
        self.tree.add(pair)
    }

    /// Appends `child` under `parent`, wrapping stray top-level content in the
    /// module's implicit document and translating append failures.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), PaircError> {
        let parent = self.redirect_top_level(parent, child)?;

        match self.tree.append_child(parent, child) {
            Ok(()) => {}
            Err(fault @ StructuralFault::NamespaceDefinitionOutOfOrder { .. }) => {
                return Err(fault.into());
            }
            Err(StructuralFault::ChildrenNotAllowed { kind, .. }) => {
                let name = self.tree[parent].qualified_name();
                let span = self.tree[child].span;
                self.report(ErrorCode::BlockIsNotExpected, &[kind, &name], span)?;
                let orphan = self.orphan();
                self.tree.append_child(orphan, child)?;
                return Ok(());
            }
        }

        if self.tree[child].delimiter.is_choice() {
            self.register_choice(child);
        }
        Ok(())
    }

    fn redirect_top_level(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, PaircError> {
        if parent != self.module {
            return Ok(parent);
        }
        match self.tree[child].kind {
            PairKind::Document { .. }
            | PairKind::AliasDefinition(_)
            | PairKind::NamespaceDefinition
            | PairKind::Comment => return Ok(parent),
            _ => {}
        }

        let existing = self.tree.children(self.module).iter().rev().copied().find(|c| {
            matches!(self.tree[*c].kind, PairKind::Document { implicit: true, .. })
        });
        if let Some(doc) = existing {
            return Ok(doc);
        }

        let stem = Path::new(&*self.tree[self.module].file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let span = self.tree[child].span;
        let mut pair = Pair::new(
            PairKind::Document {
                choice_info: Default::default(),
                implicit: true,
            },
            span,
            self.stream.name().clone(),
            self.file_index,
        )
        .with_name(stem)
        .with_delimiter(DelimiterKind::Colon);
        pair.value_kind = ValueKind::Object;
        let doc = self.tree.add(pair);
        self.tree.append_child(self.module, doc)?;
        debug!(document = self.tree[doc].name_str(), "created implicit document");
        Ok(doc)
    }

    /// Mirrors a choice pair into its document's choice tree.
    fn register_choice(&mut self, choice: NodeId) {
        let Some(doc) = self.tree.enclosing_document(choice) else {
            return;
        };
        let enclosing = self
            .tree
            .ancestors(choice)
            .take_while(|a| *a != doc)
            .find(|a| self.tree[*a].delimiter.is_choice());
        if let PairKind::Document { choice_info, .. } = &mut self.tree[doc].kind {
            choice_info.insert(enclosing, choice);
        }
    }
}

#[cfg(test)]
mod tests;
