use super::NodeId;
use crate::diagnostics::Diagnostic;

/// A diagnostic raised inside one alternative of a choice.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchError {
    pub branch: NodeId,
    pub diagnostic: Diagnostic,
}

/// Mirror of a document's choice pairs (`::`, `=:`), kept beside the main
/// tree so per-branch errors can be collected without touching the pairs.
///
/// The root of a document's tree has no `choice`; every other node stands for
/// one choice pair, nested the way the choice pairs nest in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceInfo {
    pub choice: Option<NodeId>,
    pub children: Vec<ChoiceInfo>,
    pub errors: Vec<BranchError>,
}

impl ChoiceInfo {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn find(&self, choice: NodeId) -> Option<&ChoiceInfo> {
        if self.choice == Some(choice) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(choice))
    }

    pub fn find_mut(&mut self, choice: NodeId) -> Option<&mut ChoiceInfo> {
        if self.choice == Some(choice) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(choice))
    }

    /// Registers `choice` under `enclosing` (or under the root when `None`).
    /// Falls back to the root if `enclosing` was never registered.
    pub fn insert(&mut self, enclosing: Option<NodeId>, choice: NodeId) {
        let node = ChoiceInfo {
            choice: Some(choice),
            ..Default::default()
        };
        match enclosing.and_then(|e| self.find_mut(e)) {
            Some(parent) => parent.children.push(node),
            None => self.children.push(node),
        }
    }

    /// Records `diagnostic` against `branch` of `choice`. Returns `false` when
    /// `choice` is unknown.
    pub fn record_error(&mut self, choice: NodeId, branch: NodeId, diagnostic: Diagnostic) -> bool {
        match self.find_mut(choice) {
            Some(info) => {
                info.errors.push(BranchError { branch, diagnostic });
                true
            }
            None => false,
        }
    }

    /// Number of choice pairs in this subtree, the root excluded.
    pub fn count(&self) -> usize {
        self.children.iter().map(|c| 1 + c.count()).sum()
    }
}
