// Author: Dustin Pilgrim
// License: MIT

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::name::NameToken;
use crate::ast::{
    AliasDefinitionInfo, ChoiceInfo, DelimiterKind, NodeId, Pair, PairKind, PairTree,
    ParameterPosition, Span, TargetFormat, ValueKind,
};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").expect("valid number regex")
});

static BOOLEAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(true|false)$").expect("valid boolean regex"));

/// Prefix written before a pair name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    None,
    /// `!name`
    Document,
    /// `!$name`
    AliasDefinition,
    /// `!#prefix`
    NamespaceDefinition,
    /// `!%name`
    Parameter,
    /// `$name`
    Alias,
    /// `%name`: an argument or a parameter depending on where it appears.
    Percent,
    /// `#prefix` or `#prefix.name`
    Scope,
    /// `@name`
    Attribute,
}

impl Sigil {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sigil::None => "",
            Sigil::Document => "!",
            Sigil::AliasDefinition => "!$",
            Sigil::NamespaceDefinition => "!#",
            Sigil::Parameter => "!%",
            Sigil::Alias => "$",
            Sigil::Percent => "%",
            Sigil::Scope => "#",
            Sigil::Attribute => "@",
        }
    }
}

/// Everything the parser knows about a pair when asking for a node.
#[derive(Debug, Clone)]
pub struct NodeContext<'a> {
    pub sigil: Sigil,
    pub name: Option<&'a NameToken>,
    pub delimiter: DelimiterKind,
    pub span: Span,
    /// Container the pair is parsed into. Value references get their owner.
    pub parent: NodeId,
    /// The pair is a reference in value position (`= $a`, `"..%p.."`).
    pub value_position: bool,
    /// The pair sits in the `( ... )` group right after an alias usage,
    /// as in `$point(x = 1)`.
    pub inline_argument: bool,
    pub file_name: Rc<str>,
    pub file_index: usize,
}

/// Turns sigils and names into typed pairs for one target format.
pub trait NodeFactory {
    fn create_pair(&self, ctx: &NodeContext<'_>, tree: &PairTree) -> Pair;

    /// Kind of an unquoted single-line value.
    fn open_value_kind(&self, text: &str) -> ValueKind;
}

pub fn factory_for(format: TargetFormat) -> Box<dyn NodeFactory> {
    match format {
        TargetFormat::Xml => Box::new(XmlNodeFactory),
        TargetFormat::Json => Box::new(JsonNodeFactory),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XmlNodeFactory;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNodeFactory;

impl NodeFactory for XmlNodeFactory {
    fn create_pair(&self, ctx: &NodeContext<'_>, tree: &PairTree) -> Pair {
        if let Some(kind) = shared_kind(ctx, tree) {
            return base_pair(ctx, kind, name_text(ctx));
        }

        let kind = match ctx.sigil {
            Sigil::NamespaceDefinition => PairKind::NamespaceDefinition,
            Sigil::Scope => PairKind::Scope,
            Sigil::Attribute => PairKind::Attribute,
            _ => PairKind::Element,
        };

        if kind == PairKind::NamespaceDefinition {
            return base_pair(ctx, kind, name_text(ctx));
        }

        let (prefix, local) = match ctx.name {
            Some(token) if token.quoted.is_none() => split_prefixed(&token.text),
            Some(token) => (None, Some(token.text.clone())),
            None => (None, None),
        };

        if kind == PairKind::Scope {
            // `#p` names only the prefix; `#p.local` also names an element.
            let (prefix, local) = match (prefix, local) {
                (Some(p), local) => (Some(p), local),
                (None, local) => (local, None),
            };
            let mut pair = base_pair(ctx, kind, local);
            pair.ns_prefix = prefix;
            return pair;
        }

        let mut pair = base_pair(ctx, kind, local);
        pair.ns_prefix = prefix;
        pair
    }

    fn open_value_kind(&self, _text: &str) -> ValueKind {
        ValueKind::OpenString
    }
}

impl NodeFactory for JsonNodeFactory {
    fn create_pair(&self, ctx: &NodeContext<'_>, tree: &PairTree) -> Pair {
        if let Some(kind) = shared_kind(ctx, tree) {
            return base_pair(ctx, kind, name_text(ctx));
        }

        // JSON has no namespaces or attributes: keep the sigil in the name.
        let name = match ctx.sigil {
            Sigil::NamespaceDefinition | Sigil::Scope | Sigil::Attribute => Some(format!(
                "{}{}",
                ctx.sigil.as_str(),
                ctx.name.map(|n| n.text.as_str()).unwrap_or("")
            )),
            _ => name_text(ctx),
        };
        base_pair(ctx, PairKind::Element, name)
    }

    fn open_value_kind(&self, text: &str) -> ValueKind {
        if text == "null" {
            ValueKind::Null
        } else if BOOLEAN_RE.is_match(text) {
            ValueKind::Boolean
        } else if NUMBER_RE.is_match(text) {
            ValueKind::Number
        } else {
            ValueKind::OpenString
        }
    }
}

/// Kinds that mean the same thing in every target format.
fn shared_kind(ctx: &NodeContext<'_>, tree: &PairTree) -> Option<PairKind> {
    let kind = match ctx.sigil {
        Sigil::Document => PairKind::Document {
            choice_info: ChoiceInfo::root(),
            implicit: false,
        },
        Sigil::AliasDefinition => PairKind::AliasDefinition(AliasDefinitionInfo::default()),
        Sigil::Parameter => PairKind::Parameter {
            bound_alias_definition: None,
            position: ParameterPosition::Block,
        },
        Sigil::Alias => PairKind::Alias {
            resolved_definition: None,
        },
        Sigil::Percent => percent_kind(ctx, tree),
        Sigil::None if ctx.inline_argument && ctx.name.is_some() => PairKind::Argument,
        _ => return None,
    };
    Some(kind)
}

/// `%name` is an argument when given to an alias and a parameter when used
/// inside an alias definition. Anywhere else it is an argument, which the
/// resolver reports as misplaced.
fn percent_kind(ctx: &NodeContext<'_>, tree: &PairTree) -> PairKind {
    let parameter = |position| PairKind::Parameter {
        bound_alias_definition: None,
        position,
    };

    if ctx.value_position {
        return parameter(ParameterPosition::Value);
    }
    let parent = &tree[ctx.parent];
    if matches!(parent.kind, PairKind::Alias { .. }) {
        return PairKind::Argument;
    }
    if parent.kind.is_alias_definition() || tree.enclosing_alias_definition(ctx.parent).is_some() {
        return parameter(ParameterPosition::Block);
    }
    PairKind::Argument
}

fn name_text(ctx: &NodeContext<'_>) -> Option<String> {
    ctx.name.map(|n| n.text.clone()).filter(|n| !n.is_empty())
}

/// Splits `prefix.local` on the first dot when both sides are non-empty.
fn split_prefixed(text: &str) -> (Option<String>, Option<String>) {
    match text.split_once('.') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
            (Some(prefix.to_string()), Some(local.to_string()))
        }
        _ if text.is_empty() => (None, None),
        _ => (None, Some(text.to_string())),
    }
}

fn base_pair(ctx: &NodeContext<'_>, kind: PairKind, name: Option<String>) -> Pair {
    let mut pair = Pair::new(kind, ctx.span, ctx.file_name.clone(), ctx.file_index)
        .with_delimiter(ctx.delimiter);
    pair.name = name;
    if let Some(token) = ctx.name {
        pair.name_span = token.span;
    }
    pair.value_kind = match ctx.delimiter {
        DelimiterKind::Colon | DelimiterKind::DoubleColon => ValueKind::Object,
        DelimiterKind::ColonEqual => ValueKind::Concatenation,
        DelimiterKind::EqualColon => ValueKind::LiteralChoice,
        _ => ValueKind::None,
    };
    pair
}
