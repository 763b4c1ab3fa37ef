use once_cell::unsync::OnceCell;

use crate::tree::{Kind, NodeId, NodeRef, SyntaxTree};

/// Read-only scope lookups over the tree being scanned.
///
/// Enclosing class/method answers are memoized per node, so rules that ask
/// repeatedly pay for each upward walk once. One context lives for one scan.
pub struct EngineContext<'t> {
    tree: &'t SyntaxTree,
    enclosing_class: Vec<OnceCell<Option<NodeId>>>,
    enclosing_method: Vec<OnceCell<Option<NodeId>>>,
}

impl<'t> EngineContext<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            enclosing_class: (0..tree.len()).map(|_| OnceCell::new()).collect(),
            enclosing_method: (0..tree.len()).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn node_text(&self, node: NodeId) -> &'t str {
        self.tree.node(node).text()
    }

    /// Nearest [`Kind::ClassDecl`] at or above `node`.
    pub fn enclosing_class(&self, node: NodeRef<'t>) -> Option<NodeRef<'t>> {
        self.enclosing(node, Kind::ClassDecl, &self.enclosing_class)
    }

    /// Nearest [`Kind::MethodDecl`] at or above `node`.
    pub fn enclosing_method(&self, node: NodeRef<'t>) -> Option<NodeRef<'t>> {
        self.enclosing(node, Kind::MethodDecl, &self.enclosing_method)
    }

    fn enclosing(
        &self,
        node: NodeRef<'t>,
        kind: Kind,
        memo: &[OnceCell<Option<NodeId>>],
    ) -> Option<NodeRef<'t>> {
        // Walk up until a hit or a memoized ancestor, then fill the path.
        let mut path = Vec::new();
        let mut cursor = Some(node);
        let answer = loop {
            let Some(current) = cursor else {
                break None;
            };
            if let Some(known) = memo[current.id().index()].get() {
                break *known;
            }
            if current.is(kind) {
                break Some(current.id());
            }
            path.push(current.id());
            cursor = current.parent();
        };
        for id in path {
            let _ = memo[id.index()].set(answer);
        }
        answer.map(|id| self.tree.node(id))
    }
}
