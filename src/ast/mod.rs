// Author: Dustin Pilgrim
// License: MIT

//! The pair tree.
//!
//! Every construct of the notation (documents, elements, attributes, aliases,
//! parameters, namespace definitions, comments...) is a [`Pair`]. Pairs live
//! in a [`PairTree`] arena and refer to each other through [`NodeId`]s: the
//! `children` lists are the only ownership edges, while links computed by the
//! resolver (alias to definition, parameter to definition) are plain ids.

use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

mod choice;
mod tree;
mod unit;

pub use choice::{BranchError, ChoiceInfo};
pub use tree::PairTree;
pub use unit::CompileUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    pub fn point(at: Position) -> Self {
        Span { start: at, end: at }
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.start.offset <= self.end.offset
            && (self.start.line, self.start.column) <= (self.end.line, self.end.column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Xml,
    Json,
}

impl TargetFormat {
    /// Infers the format from a file extension (`.pxml` / `.pjson`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pxml") => Some(TargetFormat::Xml),
            Some(ext) if ext.eq_ignore_ascii_case("pjson") => Some(TargetFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Xml => "xml",
            TargetFormat::Json => "json",
        }
    }
}

/// The operator that introduced a pair's value or children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DelimiterKind {
    #[default]
    None,
    /// `=`
    Equal,
    /// `==`
    DoubleEqual,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// `:=`
    ColonEqual,
    /// `=:`
    EqualColon,
}

impl DelimiterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelimiterKind::None => "",
            DelimiterKind::Equal => "=",
            DelimiterKind::DoubleEqual => "==",
            DelimiterKind::Colon => ":",
            DelimiterKind::DoubleColon => "::",
            DelimiterKind::ColonEqual => ":=",
            DelimiterKind::EqualColon => "=:",
        }
    }

    /// Delimiters followed by children rather than a value.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            DelimiterKind::Colon
                | DelimiterKind::DoubleColon
                | DelimiterKind::ColonEqual
                | DelimiterKind::EqualColon
        )
    }

    pub fn is_value(&self) -> bool {
        matches!(self, DelimiterKind::Equal | DelimiterKind::DoubleEqual)
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, DelimiterKind::DoubleColon | DelimiterKind::EqualColon)
    }
}

/// How a pair's value was written, which decides quoting and typing downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ValueKind {
    #[default]
    None,
    Empty,
    SingleQuoted,
    DoubleQuoted,
    OpenString,
    FoldedOpenString,
    /// The value is supplied by an alias or parameter reference.
    PairValue,
    Null,
    Number,
    Boolean,
    Object,
    Concatenation,
    LiteralChoice,
}

impl ValueKind {
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ValueKind::Empty
                | ValueKind::SingleQuoted
                | ValueKind::DoubleQuoted
                | ValueKind::OpenString
                | ValueKind::FoldedOpenString
                | ValueKind::Concatenation
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterPosition {
    /// Used where a value is expected (`name = %param`, interpolation).
    Value,
    /// Used as a pair of its own inside a block.
    Block,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasDefinitionInfo {
    /// Named parameters, first occurrence of each name, in document order.
    pub parameters: Vec<NodeId>,
    pub has_default_block_parameter: bool,
    pub has_default_value_parameter: bool,
    pub has_circular_reference: bool,
}

/// Variant-specific payload of a pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairKind {
    Module {
        target_format: TargetFormat,
    },
    Document {
        choice_info: ChoiceInfo,
        /// Created to hold top-level content written outside any document.
        implicit: bool,
    },
    Element,
    Attribute,
    Scope,
    AliasDefinition(AliasDefinitionInfo),
    Alias {
        resolved_definition: Option<NodeId>,
    },
    Parameter {
        bound_alias_definition: Option<NodeId>,
        position: ParameterPosition,
    },
    Argument,
    NamespaceDefinition,
    Comment,
}

impl PairKind {
    pub fn name(&self) -> &'static str {
        match self {
            PairKind::Module { .. } => "module",
            PairKind::Document { .. } => "document",
            PairKind::Element => "element",
            PairKind::Attribute => "attribute",
            PairKind::Scope => "scope",
            PairKind::AliasDefinition(_) => "alias definition",
            PairKind::Alias { .. } => "alias",
            PairKind::Parameter { .. } => "parameter",
            PairKind::Argument => "argument",
            PairKind::NamespaceDefinition => "namespace definition",
            PairKind::Comment => "comment",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, PairKind::Comment)
    }

    pub fn is_namespace_definition(&self) -> bool {
        matches!(self, PairKind::NamespaceDefinition)
    }

    pub fn is_alias_definition(&self) -> bool {
        matches!(self, PairKind::AliasDefinition(_))
    }

    /// Module, Document and AliasDefinition own a lexical alias scope.
    pub fn is_scope_owner(&self) -> bool {
        matches!(
            self,
            PairKind::Module { .. } | PairKind::Document { .. } | PairKind::AliasDefinition(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub kind: PairKind,
    pub name: Option<String>,
    /// Namespace prefix written before the name (`prefix.name`, `#prefix`).
    pub ns_prefix: Option<String>,
    /// Namespace URI bound by the resolver.
    pub namespace_uri: Option<String>,
    pub value: Option<String>,
    pub value_kind: ValueKind,
    pub delimiter: DelimiterKind,
    pub children: Vec<NodeId>,
    pub interpolation_items: Option<Vec<NodeId>>,
    pub parent: Option<NodeId>,
    pub is_choice: bool,
    pub span: Span,
    pub name_span: Span,
    pub file_name: Rc<str>,
    pub file_index: usize,
}

impl Pair {
    pub fn new(kind: PairKind, span: Span, file_name: Rc<str>, file_index: usize) -> Self {
        Pair {
            kind,
            name: None,
            ns_prefix: None,
            namespace_uri: None,
            value: None,
            value_kind: ValueKind::None,
            delimiter: DelimiterKind::None,
            children: Vec::new(),
            interpolation_items: None,
            parent: None,
            is_choice: false,
            span,
            name_span: span,
            file_name,
            file_index,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>, kind: ValueKind) -> Self {
        self.value = Some(value.into());
        self.value_kind = kind;
        self
    }

    pub fn with_delimiter(mut self, delimiter: DelimiterKind) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Name as written, including the namespace prefix.
    pub fn qualified_name(&self) -> String {
        match (&self.ns_prefix, &self.name) {
            (Some(p), Some(n)) => format!("{}.{}", p, n),
            (Some(p), None) => p.clone(),
            (None, Some(n)) => n.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn alias_definition(&self) -> Option<&AliasDefinitionInfo> {
        match &self.kind {
            PairKind::AliasDefinition(info) => Some(info),
            _ => None,
        }
    }
}
