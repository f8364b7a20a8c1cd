// Author: Dustin Pilgrim
// License: MIT

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::NodeId;

/// Namespace URI bound to the `xml` prefix in every module.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    pub uri: String,
    /// `None` for predefined prefixes.
    pub definition: Option<NodeId>,
}

/// Names declared directly by one container.
#[derive(Debug, Default)]
pub struct Frame {
    /// `None` for the compile-unit wide frame.
    pub owner: Option<NodeId>,
    pub aliases: IndexMap<String, NodeId>,
    pub namespaces: IndexMap<String, NamespaceBinding>,
}

impl Frame {
    pub fn new(owner: Option<NodeId>) -> Self {
        Frame {
            owner,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct Link {
    frame: Option<Rc<Frame>>,
    default_namespace: Option<String>,
    parent: ResolutionScope,
}

/// Immutable chain of frames, innermost first. Pushing shares the tail, so a
/// scope can be kept and extended while the traversal moves on.
#[derive(Debug, Clone, Default)]
pub struct ResolutionScope {
    head: Option<Rc<Link>>,
}

impl ResolutionScope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: Rc<Frame>) -> Self {
        self.link(Some(frame), None)
    }

    /// Scope in which unprefixed element names belong to `uri`.
    pub fn with_default_namespace(&self, uri: String) -> Self {
        self.link(None, Some(uri))
    }

    fn link(&self, frame: Option<Rc<Frame>>, default_namespace: Option<String>) -> Self {
        ResolutionScope {
            head: Some(Rc::new(Link {
                frame,
                default_namespace,
                parent: self.clone(),
            })),
        }
    }

    fn links(&self) -> impl Iterator<Item = &Link> {
        std::iter::successors(self.head.as_deref(), |link| link.parent.head.as_deref())
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.links().filter_map(|link| link.frame.as_deref())
    }

    pub fn lookup_alias(&self, name: &str) -> Option<NodeId> {
        self.frames().find_map(|f| f.aliases.get(name).copied())
    }

    pub fn lookup_namespace(&self, prefix: &str) -> Option<&NamespaceBinding> {
        self.frames().find_map(|f| f.namespaces.get(prefix))
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.links().find_map(|link| link.default_namespace.as_deref())
    }
}
