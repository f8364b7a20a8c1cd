use super::*;

/// Root of a compilation session: the arena plus the ordered module roots.
#[derive(Debug, Clone, Default)]
pub struct CompileUnit {
    pub tree: PairTree,
    modules: Vec<NodeId>,
}

impl CompileUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the root pair of a new module. The module's position in the
    /// unit is also its file index in diagnostics.
    pub fn add_module(&mut self, file_name: &str, target_format: TargetFormat) -> NodeId {
        let file_index = self.modules.len();
        let pair = Pair::new(
            PairKind::Module { target_format },
            Span::default(),
            Rc::from(file_name),
            file_index,
        )
        .with_name(file_name);
        let id = self.tree.add(pair);
        self.modules.push(id);
        id
    }

    pub fn modules(&self) -> &[NodeId] {
        &self.modules
    }

    pub fn module_format(&self, module: NodeId) -> Option<TargetFormat> {
        match self.tree.get(module)?.kind {
            PairKind::Module { target_format } => Some(target_format),
            _ => None,
        }
    }

    /// Documents of one module, in document order.
    pub fn documents(&self, module: NodeId) -> Vec<NodeId> {
        self.tree
            .children(module)
            .iter()
            .copied()
            .filter(|c| matches!(self.tree[*c].kind, PairKind::Document { .. }))
            .collect()
    }

    /// Finds a module by the file name it was created with.
    pub fn module_by_name(&self, file_name: &str) -> Option<NodeId> {
        self.modules
            .iter()
            .copied()
            .find(|m| &*self.tree[*m].file_name == file_name)
    }
}
