use std::ops::{Index, IndexMut};

use super::*;
use crate::error::StructuralFault;

/// Arena holding every pair of a compilation session.
#[derive(Debug, Clone, Default)]
pub struct PairTree {
    nodes: Vec<Pair>,
}

impl PairTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stores a detached pair and returns its id.
    pub fn add(&mut self, pair: Pair) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pair);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Pair> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Pair> {
        self.nodes.get_mut(id.index())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    /// Children that are not comments.
    pub fn content_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self[id]
            .children
            .iter()
            .copied()
            .filter(move |c| !self[*c].kind.is_comment())
    }

    /// Children tagged as choice alternatives.
    pub fn choice_objects(&self, id: NodeId) -> Vec<NodeId> {
        self[id]
            .children
            .iter()
            .copied()
            .filter(|c| self[*c].is_choice)
            .collect()
    }

    /// Parent chain, nearest first. Interpolation items report the pair
    /// holding them as their parent.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self[id].parent,
        }
    }

    /// Pre-order walk over children and interpolation items.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let pair = &self[current];
            if let Some(items) = &pair.interpolation_items {
                stack.extend(items.iter().rev().copied());
            }
            stack.extend(pair.children.iter().rev().copied());
        }
        out
    }

    /// Whether a block of children may still be appended under `id`.
    pub fn accepts_children(&self, id: NodeId) -> bool {
        let pair = &self[id];
        match pair.kind {
            PairKind::Comment | PairKind::NamespaceDefinition => false,
            _ if pair.value_kind == ValueKind::PairValue => false,
            _ if pair.delimiter.is_value() => false,
            _ => true,
        }
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// Comments are accepted anywhere. A namespace definition may only be
    /// appended while every existing child of `parent` is a comment or another
    /// namespace definition.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralFault> {
        let child_is_comment = self[child].kind.is_comment();

        if !child_is_comment && !self.accepts_children(parent) {
            let p = &self[parent];
            return Err(StructuralFault::ChildrenNotAllowed {
                kind: p.kind.name(),
                line: p.span.start.line,
                column: p.span.start.column,
            });
        }

        if self[child].kind.is_namespace_definition() {
            let has_content = self[parent].children.iter().any(|c| {
                let kind = &self[*c].kind;
                !kind.is_comment() && !kind.is_namespace_definition()
            });
            if has_content {
                let c = &self[child];
                return Err(StructuralFault::NamespaceDefinitionOutOfOrder {
                    prefix: c.name_str().to_string(),
                    line: c.span.start.line,
                    column: c.span.start.column,
                });
            }
        }

        let choice = self[parent].delimiter.is_choice() && !child_is_comment;
        let node = &mut self[child];
        node.parent = Some(parent);
        if choice {
            node.is_choice = true;
        }
        self[parent].children.push(child);
        Ok(())
    }

    /// Attaches the value reference of a `name = $alias` / `name = %param` pair.
    pub(crate) fn set_value_reference(&mut self, owner: NodeId, reference: NodeId) {
        self[reference].parent = Some(owner);
        let pair = &mut self[owner];
        pair.children.push(reference);
        pair.value_kind = ValueKind::PairValue;
    }

    /// Installs interpolation items; they are owned by `owner` like children.
    pub fn set_interpolation_items(&mut self, owner: NodeId, items: Vec<NodeId>) {
        for item in &items {
            self[*item].parent = Some(owner);
        }
        self[owner].interpolation_items = Some(items);
    }

    /// Removes and returns all children of `id`, leaving them detached.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self[id].children);
        for c in &children {
            self[*c].parent = None;
        }
        children
    }

    /// Moves already-ordered children under `parent` without re-validating
    /// their order.
    pub fn adopt_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for c in &children {
            self[*c].parent = Some(parent);
        }
        self[parent].children.extend(children);
    }

    /// Nearest enclosing alias definition, if any.
    pub fn enclosing_alias_definition(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|a| self[*a].kind.is_alias_definition())
    }

    pub fn enclosing_document(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| matches!(self[*a].kind, PairKind::Document { .. }))
    }
}

impl Index<NodeId> for PairTree {
    type Output = Pair;

    fn index(&self, id: NodeId) -> &Pair {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for PairTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Pair {
        &mut self.nodes[id.index()]
    }
}

pub struct Ancestors<'a> {
    tree: &'a PairTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree[current].parent;
        Some(current)
    }
}
