use super::*;
use crate::ast::Pair;

impl Resolver<'_> {
    /// Namespace definitions written directly under `owner`.
    pub(super) fn collect_namespaces(&mut self, owner: NodeId, frame: &mut Frame) -> Result<(), PaircError> {
        let definitions: Vec<NodeId> = self
            .unit
            .tree
            .children(owner)
            .iter()
            .copied()
            .filter(|c| self.unit.tree[*c].kind.is_namespace_definition())
            .collect();

        for def in definitions {
            let pair = &self.unit.tree[def];
            let prefix = pair.name_str().to_string();
            let span = pair.name_span;
            if frame.namespaces.contains_key(&prefix) {
                self.report(ErrorCode::DuplicateNamespaceDefinition, &[&prefix], def, span)?;
                continue;
            }
            let uri = pair.value.clone().unwrap_or_default();
            frame.namespaces.insert(
                prefix,
                NamespaceBinding {
                    uri,
                    definition: Some(def),
                },
            );
        }
        Ok(())
    }

    /// Binds the namespace URI of an element, attribute or scope.
    ///
    /// Prefixed names look the prefix up; unprefixed elements take the default
    /// namespace of the nearest enclosing scope.
    pub(super) fn resolve_namespace(&mut self, id: NodeId, scope: &ResolutionScope) -> Result<(), PaircError> {
        let pair = &self.unit.tree[id];
        let uri = match &pair.ns_prefix {
            Some(prefix) => match scope.lookup_namespace(prefix) {
                Some(binding) => Some(binding.uri.clone()),
                None => {
                    let prefix = prefix.clone();
                    let span = pair.name_span;
                    return self.report(ErrorCode::NamespacePrefixNotDefined, &[&prefix], id, span);
                }
            },
            None if pair.kind == PairKind::Element => scope.default_namespace().map(str::to_string),
            None => None,
        };

        if uri.is_some() {
            trace!(name = %self.unit.tree[id].qualified_name(), uri = ?uri, "namespace bound");
        }
        self.unit.tree[id].namespace_uri = uri;
        Ok(())
    }

    /// Default namespace a scope pair opens, looked up without reporting.
    pub(super) fn scope_namespace(&self, id: NodeId, scope: &ResolutionScope) -> Option<String> {
        let pair = &self.unit.tree[id];
        if pair.kind != PairKind::Scope {
            return None;
        }
        let prefix = pair.ns_prefix.as_deref()?;
        scope.lookup_namespace(prefix).map(|b| b.uri.clone())
    }

    /// `#p.name: children` becomes `#p: name: children`: the scope keeps its
    /// prefix and gets a single synthetic element holding the children.
    pub(super) fn rewrite_scope(&mut self, id: NodeId) {
        let tree = &mut self.unit.tree;
        if tree[id].kind != PairKind::Scope || tree[id].name.is_none() {
            return;
        }

        let name = tree[id].name.take();
        let children = tree.take_children(id);
        let scope = &tree[id];
        let mut element = Pair::new(
            PairKind::Element,
            scope.span,
            scope.file_name.clone(),
            scope.file_index,
        )
        .with_delimiter(scope.delimiter);
        element.name = name;
        element.ns_prefix = scope.ns_prefix.clone();
        element.name_span = scope.name_span;
        element.value_kind = scope.value_kind;

        let element = tree.add(element);
        tree.adopt_children(element, children);
        tree.adopt_children(id, vec![element]);
        tree[id].value_kind = ValueKind::Object;
        debug!(element = %tree[element].qualified_name(), "rewrote named scope");
    }
}
