// Author: Dustin Pilgrim
// License: MIT

//! Alias expansion over a resolved compile unit.
//!
//! Produces an owned tree per document in which alias usages are replaced by
//! the body (or value) of their definition and parameters by the arguments
//! bound to them. Scopes are flattened into their children; definitions,
//! namespace definitions and comments disappear.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{trace, warn};

use crate::ast::{CompileUnit, NodeId, PairKind, PairTree, ValueKind};

/// Alias nesting beyond this depth expands to nothing.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandedKind {
    Document,
    Element,
    Attribute,
}

impl ExpandedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpandedKind::Document => "document",
            ExpandedKind::Element => "element",
            ExpandedKind::Attribute => "attribute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedPair {
    pub kind: ExpandedKind,
    pub name: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub value: Option<String>,
    pub value_kind: ValueKind,
    pub is_choice: bool,
    pub children: Vec<ExpandedPair>,
}

impl ExpandedPair {
    /// Child by name, for lookups in small trees.
    pub fn child(&self, name: &str) -> Option<&ExpandedPair> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Bindings visible while a definition body is expanded.
#[derive(Debug, Default)]
struct Env {
    definition: Option<NodeId>,
    /// Arguments of the usage, first occurrence of each name.
    arguments: IndexMap<String, NodeId>,
    /// The usage, which supplies the default value and default block.
    usage: Option<NodeId>,
    /// Environment the arguments were written in.
    caller: Option<Rc<Env>>,
}

impl Env {
    fn caller(&self) -> Rc<Env> {
        self.caller.clone().unwrap_or_default()
    }
}

pub struct Expander<'u> {
    unit: &'u CompileUnit,
    max_depth: usize,
}

impl<'u> Expander<'u> {
    pub fn new(unit: &'u CompileUnit) -> Self {
        Expander {
            unit,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn tree(&self) -> &'u PairTree {
        &self.unit.tree
    }

    /// Every document of every module, in module order.
    pub fn expand_unit(&self) -> Vec<ExpandedPair> {
        self.unit
            .modules()
            .iter()
            .flat_map(|m| self.unit.documents(*m))
            .filter_map(|d| self.expand_document(d))
            .collect()
    }

    /// Expands one document; `None` when `document` is not a document pair.
    pub fn expand_document(&self, document: NodeId) -> Option<ExpandedPair> {
        if !matches!(self.tree()[document].kind, PairKind::Document { .. }) {
            return None;
        }
        trace!(document = self.tree()[document].name_str(), "expanding document");
        Some(self.expand_pair(document, &Rc::new(Env::default()), 0))
    }

    fn expand_node(&self, id: NodeId, env: &Rc<Env>, depth: usize, out: &mut Vec<ExpandedPair>) {
        match self.tree()[id].kind {
            PairKind::Document { .. } | PairKind::Element | PairKind::Attribute => {
                out.push(self.expand_pair(id, env, depth));
            }
            PairKind::Scope => self.expand_children(id, env, depth, out),
            PairKind::Alias {
                resolved_definition: Some(def),
            } => {
                if let Some(inner) = self.enter_alias(id, def, env, depth) {
                    self.expand_children(def, &inner, depth + 1, out);
                }
            }
            PairKind::Parameter { .. } => self.expand_block_parameter(id, env, depth, out),
            _ => {}
        }
    }

    fn expand_children(&self, id: NodeId, env: &Rc<Env>, depth: usize, out: &mut Vec<ExpandedPair>) {
        let tree = self.tree();
        // the only child of a value-reference pair is the reference itself
        if tree[id].value_kind == ValueKind::PairValue {
            return;
        }
        for child in tree.children(id) {
            self.expand_node(*child, env, depth, out);
        }
    }

    fn expand_pair(&self, id: NodeId, env: &Rc<Env>, depth: usize) -> ExpandedPair {
        let pair = &self.tree()[id];
        let kind = match pair.kind {
            PairKind::Document { .. } => ExpandedKind::Document,
            PairKind::Attribute => ExpandedKind::Attribute,
            _ => ExpandedKind::Element,
        };

        let (value, mut value_kind) = self.value_of(id, env, depth);
        let mut children = Vec::new();
        if pair.value_kind == ValueKind::PairValue {
            // `name = $block` takes the body of a block alias
            if value.is_none() {
                if let Some(reference) = self.reference_of(id) {
                    self.expand_node(reference, env, depth, &mut children);
                }
            }
        } else if pair.interpolation_items.is_none() {
            self.expand_children(id, env, depth, &mut children);
        }
        if value.is_none() && !children.is_empty() {
            value_kind = ValueKind::Object;
        }

        ExpandedPair {
            kind,
            name: pair.name_str().to_string(),
            prefix: pair.ns_prefix.clone(),
            namespace: pair.namespace_uri.clone(),
            value,
            value_kind,
            is_choice: pair.is_choice,
            children,
        }
    }

    /// Value of a pair as seen from `env`.
    fn value_of(&self, id: NodeId, env: &Rc<Env>, depth: usize) -> (Option<String>, ValueKind) {
        let tree = self.tree();
        let pair = &tree[id];

        if let Some(items) = &pair.interpolation_items {
            let mut text = String::new();
            for item in items {
                let (part, _) = match tree[*item].kind {
                    PairKind::Element => self.value_of(*item, env, depth),
                    _ => self.reference_value(*item, env, depth),
                };
                text.push_str(part.as_deref().unwrap_or(""));
            }
            return (Some(text), ValueKind::Concatenation);
        }

        if pair.value_kind == ValueKind::PairValue {
            return match self.reference_of(id) {
                Some(reference) => self.reference_value(reference, env, depth),
                None => (None, ValueKind::None),
            };
        }
        (pair.value.clone(), pair.value_kind)
    }

    fn reference_of(&self, id: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        tree.children(id).iter().copied().find(|c| {
            matches!(
                tree[*c].kind,
                PairKind::Alias { .. } | PairKind::Parameter { .. }
            )
        })
    }

    fn reference_value(&self, reference: NodeId, env: &Rc<Env>, depth: usize) -> (Option<String>, ValueKind) {
        match self.tree()[reference].kind {
            PairKind::Alias {
                resolved_definition: Some(def),
            } => match self.enter_alias(reference, def, env, depth) {
                Some(inner) => self.value_of(def, &inner, depth + 1),
                None => (None, ValueKind::None),
            },
            PairKind::Parameter { .. } => self.parameter_value(reference, env, depth),
            _ => (None, ValueKind::None),
        }
    }

    fn parameter_value(&self, parameter: NodeId, env: &Rc<Env>, depth: usize) -> (Option<String>, ValueKind) {
        let tree = self.tree();
        match &tree[parameter].name {
            Some(name) => {
                if let Some(argument) = env.arguments.get(name) {
                    return self.value_of(*argument, &env.caller(), depth);
                }
                match self.parameter_default(env.definition, name) {
                    Some(default) => self.value_of(default, env, depth),
                    None => (None, ValueKind::None),
                }
            }
            None => match env.usage {
                Some(usage) => self.value_of(usage, &env.caller(), depth),
                None => (None, ValueKind::None),
            },
        }
    }

    /// The declaration of `name` in `definition` that carries a default.
    fn parameter_default(&self, definition: Option<NodeId>, name: &str) -> Option<NodeId> {
        let tree = self.tree();
        tree.descendants(definition?).into_iter().find(|id| {
            let pair = &tree[*id];
            matches!(pair.kind, PairKind::Parameter { .. })
                && pair.name.as_deref() == Some(name)
                && (pair.delimiter.is_value() || pair.value_kind == ValueKind::PairValue)
        })
    }

    fn expand_block_parameter(&self, parameter: NodeId, env: &Rc<Env>, depth: usize, out: &mut Vec<ExpandedPair>) {
        let tree = self.tree();
        match &tree[parameter].name {
            Some(name) => match env.arguments.get(name) {
                Some(argument) => self.expand_children(*argument, &env.caller(), depth, out),
                None => self.expand_children(parameter, env, depth, out),
            },
            None => {
                let Some(usage) = env.usage else {
                    return;
                };
                if tree[usage].value_kind == ValueKind::PairValue {
                    return;
                }
                let caller = env.caller();
                for child in tree.content_children(usage) {
                    if tree[child].kind != PairKind::Argument {
                        self.expand_node(child, &caller, depth, out);
                    }
                }
            }
        }
    }

    /// Environment for the body of `def` reached through `usage`, or `None`
    /// when the definition must not be expanded.
    fn enter_alias(&self, usage: NodeId, def: NodeId, env: &Rc<Env>, depth: usize) -> Option<Rc<Env>> {
        let tree = self.tree();
        let info = tree[def].alias_definition()?;
        if info.has_circular_reference {
            return None;
        }
        if depth >= self.max_depth {
            warn!(alias = tree[usage].name_str(), depth, "alias expansion depth exceeded");
            return None;
        }

        let mut arguments = IndexMap::new();
        for child in tree.content_children(usage) {
            if tree[child].kind != PairKind::Argument {
                continue;
            }
            if let Some(name) = &tree[child].name {
                arguments.entry(name.clone()).or_insert(child);
            }
        }
        Some(Rc::new(Env {
            definition: Some(def),
            arguments,
            usage: Some(usage),
            caller: Some(env.clone()),
        }))
    }
}

/// Expands every document of `unit`.
pub fn expand_unit(unit: &CompileUnit, max_depth: usize) -> Vec<ExpandedPair> {
    Expander::new(unit).with_max_depth(max_depth).expand_unit()
}

#[cfg(test)]
mod tests;
