// Author: Dustin Pilgrim
// License: MIT

//! Whole-program resolution.
//!
//! Runs after every module of a [`CompileUnit`] is parsed: binds alias usages
//! to their definitions, parameters to the definitions they belong to and
//! namespace prefixes to URIs, rewrites named scopes, detects circular alias
//! definitions and checks alias arguments against parameters.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{CompileUnit, DelimiterKind, NodeId, PairKind, Span, TargetFormat, ValueKind};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorListener, ErrorOrigin};
use crate::error::PaircError;

mod alias;
mod namespace;
mod scope;

pub use alias::{ParameterInfo, Signature};
pub use scope::{Frame, NamespaceBinding, ResolutionScope, XML_NAMESPACE};

/// Traversal state of an alias definition, for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefState {
    NotVisited,
    InProgress,
    Done,
}

/// The choice branch currently being resolved.
#[derive(Debug, Clone, Copy)]
struct ChoiceBranch {
    document: NodeId,
    choice: NodeId,
    branch: NodeId,
}

/// A definition nested in another definition's body, visited once that body
/// has been walked.
#[derive(Debug, Clone)]
struct DeferredDefinition {
    definition: NodeId,
    scope: ResolutionScope,
    branch: Option<ChoiceBranch>,
}

/// Resolves `unit` and returns it annotated.
///
/// Problems in the input are reported to `listener`; an error is returned
/// only when the listener gives up (see [`crate::diagnostics::ErrorCollection`]).
pub fn resolve(unit: CompileUnit, listener: &mut dyn ErrorListener) -> Result<CompileUnit, PaircError> {
    let mut resolver = Resolver::new(unit, listener);
    resolver.run()?;
    Ok(resolver.into_unit())
}

pub struct Resolver<'l> {
    unit: CompileUnit,
    listener: &'l mut dyn ErrorListener,
    root: ResolutionScope,
    frames: HashMap<NodeId, Rc<Frame>>,
    states: HashMap<NodeId, DefState>,
    /// Definitions being expanded through references, outermost first.
    chain: Vec<NodeId>,
    signatures: HashMap<NodeId, Rc<Signature>>,
    choice_stack: Vec<ChoiceBranch>,
    /// Nested definitions per definition body being walked.
    deferred: Vec<Vec<DeferredDefinition>>,
}

impl<'l> Resolver<'l> {
    pub fn new(unit: CompileUnit, listener: &'l mut dyn ErrorListener) -> Self {
        Resolver {
            unit,
            listener,
            root: ResolutionScope::empty(),
            frames: HashMap::new(),
            states: HashMap::new(),
            chain: Vec::new(),
            signatures: HashMap::new(),
            choice_stack: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn into_unit(self) -> CompileUnit {
        self.unit
    }

    pub fn run(&mut self) -> Result<(), PaircError> {
        let modules = self.unit.modules().to_vec();
        debug!(modules = modules.len(), "resolving compile unit");

        self.root = ResolutionScope::empty().push(Rc::new(self.global_frame(&modules)?));
        let root = self.root.clone();
        for module in modules {
            trace!(module = self.unit.tree[module].name_str(), "resolving module");
            self.visit(module, &root)?;
        }
        Ok(())
    }

    /// Module-level definitions of every module; the first module defining a
    /// name wins.
    fn global_frame(&mut self, modules: &[NodeId]) -> Result<Frame, PaircError> {
        let mut global = Frame::new(None);
        global.namespaces.insert(
            "xml".to_string(),
            NamespaceBinding {
                uri: XML_NAMESPACE.to_string(),
                definition: None,
            },
        );
        for module in modules {
            let frame = self.frame_for(*module)?;
            for (name, def) in &frame.aliases {
                global.aliases.entry(name.clone()).or_insert(*def);
            }
            for (prefix, binding) in &frame.namespaces {
                global
                    .namespaces
                    .entry(prefix.clone())
                    .or_insert_with(|| binding.clone());
            }
        }
        Ok(global)
    }

    fn visit(&mut self, id: NodeId, scope: &ResolutionScope) -> Result<(), PaircError> {
        if self.unit.tree[id].kind.is_alias_definition() {
            if let Some(pending) = self.deferred.last_mut() {
                pending.push(DeferredDefinition {
                    definition: id,
                    scope: scope.clone(),
                    branch: self.choice_stack.last().copied(),
                });
                return Ok(());
            }
            return self.visit_definition(id, scope, false);
        }

        self.rewrite_scope(id);
        let mut inner = self.enter(id, scope)?;

        match self.unit.tree[id].kind {
            PairKind::Element | PairKind::Attribute | PairKind::Scope => {
                self.resolve_namespace(id, &inner)?;
            }
            PairKind::Alias { .. } => self.resolve_alias(id, scope)?,
            PairKind::Parameter { .. } => self.bind_parameter(id)?,
            PairKind::Argument => self.check_argument_placement(id)?,
            PairKind::Document { .. } => self.check_document_roots(id)?,
            _ => {}
        }

        if self.unit.tree[id].kind == PairKind::Scope {
            if let Some(uri) = self.unit.tree[id].namespace_uri.clone() {
                inner = inner.with_default_namespace(uri);
            }
        }

        self.visit_children(id, &inner)?;
        self.annotate_value(id);
        Ok(())
    }

    fn visit_children(&mut self, id: NodeId, scope: &ResolutionScope) -> Result<(), PaircError> {
        let tracked = self.tracked_choice(id);
        let children = self.unit.tree.children(id).to_vec();

        for child in children {
            let branch = match tracked {
                Some(document) if self.unit.tree[child].is_choice => Some(ChoiceBranch {
                    document,
                    choice: id,
                    branch: child,
                }),
                _ => None,
            };
            if let Some(branch) = branch {
                self.choice_stack.push(branch);
            }
            let result = self.visit(child, scope);
            if branch.is_some() {
                self.choice_stack.pop();
            }
            result?;
        }

        let items = self.unit.tree[id].interpolation_items.clone().unwrap_or_default();
        for item in items {
            self.visit(item, scope)?;
        }
        Ok(())
    }

    /// Document whose choice tree mirrors `id`, when `id` is a choice pair.
    fn tracked_choice(&self, id: NodeId) -> Option<NodeId> {
        let tree = &self.unit.tree;
        if !tree[id].delimiter.is_choice() {
            return None;
        }
        let document = tree.enclosing_document(id)?;
        match &tree[document].kind {
            PairKind::Document { choice_info, .. } if choice_info.find(id).is_some() => {
                Some(document)
            }
            _ => None,
        }
    }

    /// Pushes the frame `id` declares, if it declares anything.
    fn enter(&mut self, id: NodeId, scope: &ResolutionScope) -> Result<ResolutionScope, PaircError> {
        let tree = &self.unit.tree;
        let declares = tree[id].kind.is_scope_owner()
            || tree
                .children(id)
                .iter()
                .any(|c| tree[*c].kind.is_namespace_definition());
        if !declares {
            return Ok(scope.clone());
        }
        let frame = self.frame_for(id)?;
        Ok(scope.push(frame))
    }

    /// The scope visible to the children of `id`, rebuilt from the root.
    fn scope_inside(&mut self, id: NodeId) -> Result<ResolutionScope, PaircError> {
        let mut path: Vec<NodeId> = self.unit.tree.ancestors(id).collect();
        path.reverse();
        path.push(id);

        let mut scope = self.root.clone();
        for node in path {
            scope = self.enter(node, &scope)?;
            if let Some(uri) = self.scope_namespace(node, &scope) {
                scope = scope.with_default_namespace(uri);
            }
        }
        Ok(scope)
    }

    /// Frame of the names `owner` declares. Built once per owner, so every
    /// duplicate is reported exactly once.
    fn frame_for(&mut self, owner: NodeId) -> Result<Rc<Frame>, PaircError> {
        if let Some(frame) = self.frames.get(&owner) {
            return Ok(frame.clone());
        }

        let mut frame = Frame::new(Some(owner));
        self.collect_namespaces(owner, &mut frame)?;
        if self.unit.tree[owner].kind.is_scope_owner() {
            self.collect_aliases(owner, &mut frame)?;
        }

        let frame = Rc::new(frame);
        self.frames.insert(owner, frame.clone());
        Ok(frame)
    }

    fn format_of(&self, id: NodeId) -> TargetFormat {
        let file_index = self.unit.tree[id].file_index;
        self.unit
            .modules()
            .get(file_index)
            .and_then(|m| self.unit.module_format(*m))
            .unwrap_or_default()
    }

    /// XML documents hold a single root element.
    fn check_document_roots(&mut self, document: NodeId) -> Result<(), PaircError> {
        if self.format_of(document) != TargetFormat::Xml {
            return Ok(());
        }
        let tree = &self.unit.tree;
        let roots: Vec<NodeId> = tree
            .content_children(document)
            .filter(|c| {
                let kind = &tree[*c].kind;
                !kind.is_namespace_definition() && !kind.is_alias_definition()
            })
            .collect();
        if roots.len() > 1 {
            let name = tree[document].name_str().to_string();
            let span = tree[roots[1]].span;
            self.report(ErrorCode::DocumentMustHaveOneRootElement, &[&name], roots[1], span)?;
        }
        Ok(())
    }

    /// Block pairs without content are empty; alias usages without a value
    /// of their own take the kind of their definition's value.
    fn annotate_value(&mut self, id: NodeId) {
        let tree = &self.unit.tree;
        let pair = &tree[id];

        if let PairKind::Alias {
            resolved_definition: Some(def),
        } = pair.kind
        {
            let own_content = tree
                .content_children(id)
                .any(|c| tree[c].kind != PairKind::Argument);
            if pair.delimiter == DelimiterKind::None
                && matches!(pair.value_kind, ValueKind::None | ValueKind::Object)
                && !own_content
            {
                let kind = tree[def].value_kind;
                self.unit.tree[id].value_kind = kind;
            }
            return;
        }

        let empty_block = pair.value_kind == ValueKind::Object
            && pair.interpolation_items.is_none()
            && tree.content_children(id).next().is_none()
            && !matches!(pair.kind, PairKind::Module { .. });
        if empty_block {
            self.unit.tree[id].value_kind = ValueKind::Empty;
        }
    }

    pub(crate) fn report(
        &mut self,
        code: ErrorCode,
        args: &[&str],
        at: NodeId,
        span: Span,
    ) -> Result<(), PaircError> {
        let pair = &self.unit.tree[at];
        let diagnostic = Diagnostic::new(
            code,
            args,
            &pair.file_name,
            pair.file_index,
            span,
            ErrorOrigin::Resolve,
        );
        trace!(code = code.as_str(), "resolve diagnostic");

        if let Some(branch) = self.choice_stack.last().copied() {
            if let PairKind::Document { choice_info, .. } = &mut self.unit.tree[branch.document].kind {
                choice_info.record_error(branch.choice, branch.branch, diagnostic.clone());
            }
        }
        self.listener.on_error(&diagnostic)
    }
}
