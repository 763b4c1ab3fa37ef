//! Language-agnostic syntax tree handed over by an external parser.
//!
//! The tree is an arena: nodes live in one table and refer to each other by
//! [`NodeId`]. Children are owned top-down from the root; the parent link is
//! a plain index recomputed on load, so the tree stays acyclic and cheap to
//! share across threads.

pub mod builder;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LintError, Result};

pub use builder::TreeBuilder;

/// Index of a node inside its owning [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kinds the rules can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    File,
    ClassDecl,
    MethodDecl,
    FieldDecl,
    Block,
    Statement,
    FunctionCall,
    MemberAccess,
    Assignment,
    ArrayLiteral,
    KeyValuePair,
    ArrayAccess,
    Concatenation,
    Literal,
    Identifier,
    /// Raw markup outside code islands (PHP inline HTML, JSX text).
    InlineMarkup,
    /// Unescaped templated output (`<?= ?>`, `{!! !!}`).
    EchoTag,
    Other,
}

/// Classification of a [`Kind::Literal`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
}

/// Source language of the parsed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Php,
    Blade,
    Java,
    JavaScript,
    TypeScript,
    #[default]
    Unknown,
}

impl Language {
    /// Operator used when rendering instance member access.
    pub fn member_separator(self) -> &'static str {
        match self {
            Self::Php | Self::Blade => "->",
            _ => ".",
        }
    }

    /// Operator used when rendering array key/value pairs.
    pub fn pair_separator(self) -> &'static str {
        match self {
            Self::Php | Self::Blade => " => ",
            _ => ": ",
        }
    }

    /// Operator used when rendering string concatenation.
    pub fn concat_operator(self) -> &'static str {
        match self {
            Self::Php | Self::Blade => " . ",
            _ => " + ",
        }
    }

    pub fn quote(self) -> char {
        match self {
            Self::Php | Self::Blade => '\'',
            _ => '"',
        }
    }
}

/// Span of a node in the original source (1-based lines, 0-based columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub end_line: Option<usize>,
    pub end_column: Option<usize>,
}

/// Location in source code, as reported to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub end_line: Option<usize>,
    pub end_column: Option<usize>,
}

/// One node of the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: Kind,
    /// Rendered source text of the node.
    pub text: String,
    /// Identifier or declaration name, when the node has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<LiteralKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip)]
    parent: Option<NodeId>,
}

impl Node {
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            name: None,
            literal: None,
            children: Vec::new(),
            span: None,
            parent: None,
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub language: Language,
    root: NodeId,
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Assemble a tree from a node table, linking parents and checking
    /// that the table forms a single tree rooted at `root`.
    pub fn from_nodes(
        path: Option<PathBuf>,
        language: Language,
        root: NodeId,
        nodes: Vec<Node>,
    ) -> Result<Self> {
        let mut tree = Self {
            path,
            language,
            root,
            nodes,
        };
        tree.link()?;
        Ok(tree)
    }

    /// Deserialize a tree exported by an external parser.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut tree: SyntaxTree = serde_json::from_str(json)?;
        tree.link()?;
        Ok(tree)
    }

    /// Load a JSON-serialized tree from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn link(&mut self) -> Result<()> {
        let len = self.nodes.len();
        if self.root.0 >= len {
            return Err(LintError::InvalidTree(format!(
                "root {} out of range ({len} nodes)",
                self.root
            )));
        }

        for node in &mut self.nodes {
            node.parent = None;
        }

        for idx in 0..len {
            let children = self.nodes[idx].children.clone();
            for child in children {
                if child.0 >= len {
                    return Err(LintError::InvalidTree(format!(
                        "node #{idx} references missing child {child}"
                    )));
                }
                if child == self.root {
                    return Err(LintError::InvalidTree(format!(
                        "root {child} appears as a child of #{idx}"
                    )));
                }
                if let Some(existing) = self.nodes[child.0].parent {
                    return Err(LintError::InvalidTree(format!(
                        "node {child} has two parents ({existing} and #{idx})"
                    )));
                }
                self.nodes[child.0].parent = Some(NodeId(idx));
            }
        }

        // Single parent per node plus full reachability from the root rules
        // out cycles.
        let reachable = self.preorder().count();
        if reachable != len {
            return Err(LintError::InvalidTree(format!(
                "{} of {len} nodes are not reachable from the root",
                len - reachable
            )));
        }

        Ok(())
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Borrow a node by id.
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node {id} not in tree");
        NodeRef { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Document-order traversal from the root.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
            seen: vec![false; self.nodes.len()],
        }
    }

    /// Host-facing location of a node, if the parser recorded a span.
    pub fn location(&self, id: NodeId) -> Option<SourceLocation> {
        let span = self.nodes.get(id.0)?.span?;
        Some(SourceLocation {
            file: self.path.clone().unwrap_or_default(),
            line: span.line,
            column: span.column,
            end_line: span.end_line,
            end_column: span.end_column,
        })
    }
}

/// Pre-order iterator over a tree.
pub struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
    seen: Vec<bool>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            // `seen` only matters while `link` is still validating.
            if std::mem::replace(&mut self.seen[id.0], true) {
                continue;
            }
            let node = &self.tree.nodes[id.0];
            self.stack.extend(
                node.children
                    .iter()
                    .rev()
                    .copied()
                    .filter(|c| c.0 < self.seen.len()),
            );
            return Some(NodeRef {
                tree: self.tree,
                id,
            });
        }
    }
}

/// Borrowed view of one node with navigation helpers.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn raw(&self) -> &'t Node {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> Kind {
        self.raw().kind
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.raw().kind == kind
    }

    pub fn text(&self) -> &'t str {
        &self.raw().text
    }

    pub fn name(&self) -> Option<&'t str> {
        self.raw().name.as_deref()
    }

    pub fn literal(&self) -> Option<LiteralKind> {
        self.raw().literal
    }

    pub fn span(&self) -> Option<Span> {
        self.raw().span
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.raw().parent.map(|id| self.tree.node(id))
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        self.raw()
            .children
            .get(index)
            .map(|&id| self.tree.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.raw().children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.raw().children.iter().map(move |&id| tree.node(id))
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Callee of a [`Kind::FunctionCall`].
    pub fn callee(&self) -> Option<NodeRef<'t>> {
        if self.is(Kind::FunctionCall) {
            self.child(0)
        } else {
            None
        }
    }

    /// Arguments of a [`Kind::FunctionCall`]; empty for any other kind.
    pub fn arguments(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let skip = if self.is(Kind::FunctionCall) { 1 } else { usize::MAX };
        self.children().skip(skip)
    }

    pub fn first_argument(&self) -> Option<NodeRef<'t>> {
        self.arguments().next()
    }

    /// Body statements of a [`Kind::MethodDecl`] (children of its first block).
    pub fn statements(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let body = if self.is(Kind::MethodDecl) {
            self.children().find(|c| c.is(Kind::Block))
        } else {
            None
        };
        body.into_iter().flat_map(|b| b.children())
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("text", &self.text())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> SyntaxTree {
        let mut b = TreeBuilder::new(Language::Php);
        let recv = b.ident("$user");
        let arg = b.ident("$data");
        let call = b.method_call(recv, "update", vec![arg]);
        let stmt = b.statement(call);
        let root = b.file(vec![stmt]);
        b.finish(root).unwrap()
    }

    #[test]
    fn preorder_is_document_order() {
        let tree = small_tree();
        let kinds: Vec<Kind> = tree.preorder().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::File,
                Kind::Statement,
                Kind::FunctionCall,
                Kind::MemberAccess,
                Kind::Identifier,
                Kind::Identifier,
                Kind::Identifier,
            ]
        );
    }

    #[test]
    fn parents_are_linked() {
        let tree = small_tree();
        let call = tree
            .preorder()
            .find(|n| n.is(Kind::FunctionCall))
            .unwrap();
        assert_eq!(call.parent().unwrap().kind(), Kind::Statement);
        assert_eq!(call.ancestors().count(), 2);
        assert_eq!(call.first_argument().unwrap().text(), "$data");
        assert_eq!(call.text(), "$user->update($data)");
    }

    #[test]
    fn json_round_trip_relinks_parents() {
        let tree = small_tree();
        let json = tree.to_json().unwrap();
        let loaded = SyntaxTree::from_json(&json).unwrap();
        let arg = loaded
            .preorder()
            .find(|n| n.text() == "$data")
            .unwrap();
        assert!(arg.parent().unwrap().is(Kind::FunctionCall));
    }

    #[test]
    fn rejects_shared_child() {
        let leaf = Node::new(Kind::Identifier, "$x");
        let mut a = Node::new(Kind::Statement, "$x;");
        a.children = vec![NodeId(0)];
        let mut b = Node::new(Kind::Statement, "$x;");
        b.children = vec![NodeId(0)];
        let mut root = Node::new(Kind::File, "");
        root.children = vec![NodeId(1), NodeId(2)];
        let err = SyntaxTree::from_nodes(
            None,
            Language::Php,
            NodeId(3),
            vec![leaf, a, b, root],
        )
        .unwrap_err();
        assert!(matches!(err, LintError::InvalidTree(_)));
    }

    #[test]
    fn rejects_detached_cycle() {
        let mut a = Node::new(Kind::Other, "a");
        a.children = vec![NodeId(1)];
        let mut b = Node::new(Kind::Other, "b");
        b.children = vec![NodeId(0)];
        let root = Node::new(Kind::File, "");
        let err =
            SyntaxTree::from_nodes(None, Language::Java, NodeId(2), vec![a, b, root]).unwrap_err();
        assert!(err.to_string().contains("not reachable"));
    }

    #[test]
    fn rejects_out_of_range_child() {
        let json = r#"{"language":"php","root":0,"nodes":[{"kind":"file","text":"","children":[5]}]}"#;
        assert!(matches!(
            SyntaxTree::from_json(json),
            Err(LintError::InvalidTree(_))
        ));
    }

    #[test]
    fn location_uses_tree_path() {
        let mut b = TreeBuilder::new(Language::Php).with_path("app/Http/UserController.php");
        let id = b.ident("$otp");
        b.at(id, 12, 4);
        let root = b.file(vec![id]);
        let tree = b.finish(root).unwrap();
        let loc = tree.location(id).unwrap();
        assert_eq!(loc.line, 12);
        assert_eq!(loc.file, PathBuf::from("app/Http/UserController.php"));
        assert!(tree.location(root).is_none());
    }
}
