use indexmap::{IndexMap, IndexSet};

use super::*;
use crate::ast::{PairTree, ParameterPosition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// First occurrence of the parameter in the definition.
    pub node: NodeId,
    pub required: bool,
    pub is_value: bool,
}

/// Parameters an alias definition accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub parameters: IndexMap<String, ParameterInfo>,
    pub has_default_value: bool,
    pub has_default_block: bool,
}

/// A diagnostic waiting for the tree borrow to end.
type Pending = (ErrorCode, Vec<String>, NodeId, Span);

impl Resolver<'_> {
    /// Alias definitions hoisted into `owner`'s frame: everything below it
    /// that is not inside another document or definition.
    pub(super) fn collect_aliases(&mut self, owner: NodeId, frame: &mut Frame) -> Result<(), PaircError> {
        let tree = &self.unit.tree;
        let mut definitions = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(owner).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let kind = &tree[id].kind;
            if kind.is_alias_definition() {
                definitions.push(id);
                continue;
            }
            if matches!(kind, PairKind::Document { .. } | PairKind::Module { .. }) {
                continue;
            }
            stack.extend(tree.children(id).iter().rev().copied());
        }

        for def in definitions {
            let pair = &self.unit.tree[def];
            let name = pair.name_str().to_string();
            if frame.aliases.contains_key(&name) {
                let span = pair.name_span;
                self.report(ErrorCode::DuplicateAliasDefName, &[&name], def, span)?;
                continue;
            }
            frame.aliases.insert(name, def);
        }
        Ok(())
    }

    fn state(&self, def: NodeId) -> DefState {
        self.states.get(&def).copied().unwrap_or(DefState::NotVisited)
    }

    /// Resolves an alias definition once.
    ///
    /// Entering structurally starts a fresh reference chain; entering through
    /// a usage extends the current one, so a usage that reaches a definition
    /// already on the chain closes a cycle. Definitions nested in the body are
    /// entered after the body's own usages, so `$n` is followed before `!$n`
    /// whatever their order.
    pub(super) fn visit_definition(
        &mut self,
        def: NodeId,
        outer: &ResolutionScope,
        via_reference: bool,
    ) -> Result<(), PaircError> {
        if self.state(def) != DefState::NotVisited {
            return Ok(());
        }
        trace!(definition = self.unit.tree[def].name_str(), via_reference, "visiting alias definition");
        self.states.insert(def, DefState::InProgress);

        let saved = if via_reference {
            None
        } else {
            Some(std::mem::take(&mut self.chain))
        };
        self.chain.push(def);

        let result = self.visit_definition_body(def, outer);

        self.chain.pop();
        if let Some(saved) = saved {
            self.chain = saved;
        }
        self.states.insert(def, DefState::Done);
        result
    }

    fn visit_definition_body(&mut self, def: NodeId, outer: &ResolutionScope) -> Result<(), PaircError> {
        self.signature(def)?;
        let inner = self.enter(def, outer)?;

        self.deferred.push(Vec::new());
        let walked = self.visit_children(def, &inner);
        let nested = self.deferred.pop().unwrap_or_default();
        walked?;

        for pending in nested {
            if let Some(branch) = pending.branch {
                self.choice_stack.push(branch);
            }
            let result = self.visit_definition(pending.definition, &pending.scope, false);
            if pending.branch.is_some() {
                self.choice_stack.pop();
            }
            result?;
        }

        self.annotate_value(def);
        Ok(())
    }

    pub(super) fn resolve_alias(&mut self, usage: NodeId, scope: &ResolutionScope) -> Result<(), PaircError> {
        let pair = &self.unit.tree[usage];
        let name = pair.name_str().to_string();
        let Some(def) = scope.lookup_alias(&name) else {
            let span = pair.name_span;
            return self.report(ErrorCode::AliasIsNotDefined, &[&name], usage, span);
        };
        self.unit.tree[usage].kind = PairKind::Alias {
            resolved_definition: Some(def),
        };

        match self.state(def) {
            DefState::InProgress => {
                if let Some(pos) = self.chain.iter().position(|d| *d == def) {
                    self.mark_circular(pos)?;
                }
            }
            DefState::NotVisited => {
                let outer = match self.unit.tree.parent(def) {
                    Some(parent) => self.scope_inside(parent)?,
                    None => self.root.clone(),
                };
                self.visit_definition(def, &outer, true)?;
            }
            DefState::Done => {}
        }

        self.check_arguments(usage, def)
    }

    /// Marks every definition from `chain[from]` on as circular.
    fn mark_circular(&mut self, from: usize) -> Result<(), PaircError> {
        let cycle = self.chain[from..].to_vec();
        for def in cycle {
            let newly_marked = match &mut self.unit.tree[def].kind {
                PairKind::AliasDefinition(info) if !info.has_circular_reference => {
                    info.has_circular_reference = true;
                    true
                }
                _ => false,
            };
            if newly_marked {
                let pair = &self.unit.tree[def];
                let (name, span) = (pair.name_str().to_string(), pair.name_span);
                debug!(definition = %name, "circular alias definition");
                self.report(ErrorCode::AliasDefHasCircularReference, &[&name], def, span)?;
            }
        }
        Ok(())
    }

    pub(super) fn bind_parameter(&mut self, id: NodeId) -> Result<(), PaircError> {
        let Some(def) = self.unit.tree.enclosing_alias_definition(id) else {
            let pair = &self.unit.tree[id];
            let (name, span) = (pair.name_str().to_string(), pair.name_span);
            return self.report(ErrorCode::ParameterMustBeDefinedInAliasDefinition, &[&name], id, span);
        };
        if let PairKind::Parameter {
            bound_alias_definition,
            ..
        } = &mut self.unit.tree[id].kind
        {
            *bound_alias_definition = Some(def);
        }
        Ok(())
    }

    pub(super) fn check_argument_placement(&mut self, id: NodeId) -> Result<(), PaircError> {
        let tree = &self.unit.tree;
        let in_alias = tree
            .parent(id)
            .is_some_and(|p| matches!(tree[p].kind, PairKind::Alias { .. }));
        if in_alias {
            return Ok(());
        }
        let pair = &tree[id];
        let (name, span) = (pair.name_str().to_string(), pair.name_span);
        self.report(ErrorCode::ArgumentMustBeDefinedInAlias, &[&name], id, span)
    }

    /// Parameters of `def`, computed once. Parameters of nested definitions
    /// belong to those definitions.
    pub fn signature(&mut self, def: NodeId) -> Result<Rc<Signature>, PaircError> {
        if let Some(signature) = self.signatures.get(&def) {
            return Ok(signature.clone());
        }

        let tree = &self.unit.tree;
        let mut signature = Signature::default();
        let mut first_default: Option<NodeId> = None;

        let mut stack: Vec<NodeId> = Vec::new();
        push_nested(tree, def, &mut stack);
        while let Some(id) = stack.pop() {
            let pair = &tree[id];
            if pair.kind.is_alias_definition() {
                continue;
            }
            if let PairKind::Parameter { position, .. } = pair.kind {
                let is_value = position == ParameterPosition::Value || pair.delimiter.is_value();
                match &pair.name {
                    Some(name) => {
                        let required = pair.delimiter == DelimiterKind::None
                            && pair.value.is_none()
                            && tree.content_children(id).next().is_none();
                        signature
                            .parameters
                            .entry(name.clone())
                            .or_insert(ParameterInfo {
                                node: id,
                                required,
                                is_value,
                            });
                    }
                    None => {
                        if is_value {
                            signature.has_default_value = true;
                        } else {
                            signature.has_default_block = true;
                        }
                        first_default.get_or_insert(id);
                    }
                }
            }
            push_nested(tree, id, &mut stack);
        }

        let conflict = first_default.filter(|_| {
            !signature.parameters.is_empty()
                || (signature.has_default_value && signature.has_default_block)
        });

        if let PairKind::AliasDefinition(info) = &mut self.unit.tree[def].kind {
            info.parameters = signature.parameters.values().map(|p| p.node).collect();
            info.has_default_value_parameter = signature.has_default_value;
            info.has_default_block_parameter = signature.has_default_block;
        }

        let signature = Rc::new(signature);
        self.signatures.insert(def, signature.clone());

        if let Some(at) = conflict {
            let name = self.unit.tree[def].name_str().to_string();
            let span = self.unit.tree[at].span;
            self.report(ErrorCode::DefaultParameterMustBeOnly, &[&name], at, span)?;
        }
        Ok(signature)
    }

    /// Checks the arguments written on `usage` against the parameters of `def`.
    fn check_arguments(&mut self, usage: NodeId, def: NodeId) -> Result<(), PaircError> {
        let signature = self.signature(def)?;
        let tree = &self.unit.tree;
        let pair = &tree[usage];
        let alias = pair.name_str().to_string();
        let mut pending: Vec<Pending> = Vec::new();
        let mut given: IndexSet<String> = IndexSet::new();

        for arg in tree
            .content_children(usage)
            .filter(|c| tree[*c].kind == PairKind::Argument)
        {
            let a = &tree[arg];
            let Some(name) = a.name.clone() else {
                continue;
            };
            if !given.insert(name.clone()) {
                pending.push((ErrorCode::DuplicateArgumentName, vec![name], arg, a.name_span));
                continue;
            }
            match signature.parameters.get(&name) {
                None => pending.push((
                    ErrorCode::ArgumentIsUnexpected,
                    vec![name, alias.clone()],
                    arg,
                    a.name_span,
                )),
                Some(p) => {
                    let value_given = a.delimiter.is_value();
                    if p.is_value && !value_given {
                        pending.push((ErrorCode::ValueArgumentIsExpected, vec![name], arg, a.name_span));
                    } else if !p.is_value && value_given {
                        pending.push((ErrorCode::BlockArgumentIsExpected, vec![name], arg, a.name_span));
                    }
                }
            }
        }

        for (name, p) in &signature.parameters {
            if p.required && !given.contains(name) {
                pending.push((
                    ErrorCode::ArgumentIsMissing,
                    vec![name.clone(), alias.clone()],
                    usage,
                    pair.name_span,
                ));
            }
        }

        let gives_value = pair.delimiter.is_value() || pair.interpolation_items.is_some();
        let gives_block = pair.value_kind != ValueKind::PairValue
            && tree
                .content_children(usage)
                .any(|c| tree[c].kind != PairKind::Argument);
        let defaults = [
            (
                signature.has_default_value,
                gives_value,
                ErrorCode::DefaultValueArgumentIsMissing,
                ErrorCode::DefaultValueArgumentIsUnexpected,
            ),
            (
                signature.has_default_block,
                gives_block,
                ErrorCode::DefaultBlockArgumentIsMissing,
                ErrorCode::DefaultBlockArgumentIsUnexpected,
            ),
        ];
        for (expected, supplied, missing, unexpected) in defaults {
            let code = match (expected, supplied) {
                (true, false) => missing,
                (false, true) => unexpected,
                _ => continue,
            };
            pending.push((code, vec![alias.clone()], usage, pair.name_span));
        }

        for (code, args, at, span) in pending {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            self.report(code, &args, at, span)?;
        }
        Ok(())
    }
}

/// Pushes children and interpolation items so they pop in document order.
fn push_nested(tree: &PairTree, id: NodeId, stack: &mut Vec<NodeId>) {
    let pair = &tree[id];
    if let Some(items) = &pair.interpolation_items {
        stack.extend(items.iter().rev().copied());
    }
    stack.extend(pair.children.iter().rev().copied());
}
