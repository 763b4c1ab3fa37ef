use std::path::PathBuf;

use super::{Kind, Language, LiteralKind, Node, NodeId, Span, SyntaxTree};
use crate::error::Result;

/// Bottom-up constructor for [`SyntaxTree`]s.
///
/// Parser front-ends push leaves first and compose them; composite helpers
/// render the node text from their children using the language's operators.
/// Parents are linked by [`TreeBuilder::finish`].
pub struct TreeBuilder {
    language: Language,
    path: Option<PathBuf>,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            path: None,
            nodes: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Push a raw node with explicit text and children.
    pub fn push(&mut self, kind: Kind, text: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        let mut node = Node::new(kind, text);
        node.children = children;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Push a node carrying a name (identifiers, declarations).
    pub fn named(
        &mut self,
        kind: Kind,
        name: &str,
        text: impl Into<String>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.push(kind, text, children);
        self.nodes[id.0].name = Some(name.to_string());
        id
    }

    /// Attach a source position to an already pushed node.
    pub fn at(&mut self, id: NodeId, line: usize, column: usize) -> NodeId {
        self.nodes[id.0].span = Some(Span {
            line,
            column,
            end_line: None,
            end_column: None,
        });
        id
    }

    fn text_of(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    fn join(&self, ids: &[NodeId], sep: &str) -> String {
        ids.iter()
            .map(|&id| self.text_of(id))
            .collect::<Vec<_>>()
            .join(sep)
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.named(Kind::Identifier, name, name, Vec::new())
    }

    fn literal(&mut self, kind: LiteralKind, text: String) -> NodeId {
        let id = self.push(Kind::Literal, text, Vec::new());
        self.nodes[id.0].literal = Some(kind);
        id
    }

    /// String literal; the rendered text keeps the quotes.
    pub fn string(&mut self, value: &str) -> NodeId {
        let q = self.language.quote();
        self.literal(LiteralKind::String, format!("{q}{value}{q}"))
    }

    pub fn number(&mut self, text: &str) -> NodeId {
        self.literal(LiteralKind::Number, text.to_string())
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.literal(LiteralKind::Boolean, value.to_string())
    }

    pub fn null(&mut self) -> NodeId {
        self.literal(LiteralKind::Null, "null".into())
    }

    /// Instance member access (`$a->b` / `a.b`).
    pub fn member(&mut self, receiver: NodeId, member: &str) -> NodeId {
        let sep = self.language.member_separator();
        self.member_with(receiver, sep, member)
    }

    /// Static member access (`User::create`).
    pub fn static_member(&mut self, receiver: NodeId, member: &str) -> NodeId {
        self.member_with(receiver, "::", member)
    }

    fn member_with(&mut self, receiver: NodeId, sep: &str, member: &str) -> NodeId {
        let text = format!("{}{sep}{member}", self.text_of(receiver));
        let member = self.ident(member);
        self.push(Kind::MemberAccess, text, vec![receiver, member])
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let text = format!("{}({})", self.text_of(callee), self.join(&args, ", "));
        let mut children = vec![callee];
        children.extend(args);
        self.push(Kind::FunctionCall, text, children)
    }

    pub fn method_call(&mut self, receiver: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
        let callee = self.member(receiver, method);
        self.call(callee, args)
    }

    pub fn static_call(&mut self, class: &str, method: &str, args: Vec<NodeId>) -> NodeId {
        let receiver = self.ident(class);
        let callee = self.static_member(receiver, method);
        self.call(callee, args)
    }

    pub fn function_call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    pub fn pair(&mut self, key: NodeId, value: NodeId) -> NodeId {
        let text = format!(
            "{}{}{}",
            self.text_of(key),
            self.language.pair_separator(),
            self.text_of(value)
        );
        self.push(Kind::KeyValuePair, text, vec![key, value])
    }

    pub fn array(&mut self, elements: Vec<NodeId>) -> NodeId {
        let text = format!("[{}]", self.join(&elements, ", "));
        self.push(Kind::ArrayLiteral, text, elements)
    }

    pub fn array_access(&mut self, base: NodeId, index: NodeId) -> NodeId {
        let text = format!("{}[{}]", self.text_of(base), self.text_of(index));
        self.push(Kind::ArrayAccess, text, vec![base, index])
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let text = format!("{} = {}", self.text_of(target), self.text_of(value));
        self.push(Kind::Assignment, text, vec![target, value])
    }

    pub fn concat(&mut self, parts: Vec<NodeId>) -> NodeId {
        let text = self.join(&parts, self.language.concat_operator());
        self.push(Kind::Concatenation, text, parts)
    }

    pub fn markup(&mut self, html: &str) -> NodeId {
        self.push(Kind::InlineMarkup, html, Vec::new())
    }

    pub fn echo(&mut self, text: &str) -> NodeId {
        self.push(Kind::EchoTag, text, Vec::new())
    }

    pub fn statement(&mut self, expr: NodeId) -> NodeId {
        let text = format!("{};", self.text_of(expr));
        self.push(Kind::Statement, text, vec![expr])
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        let text = format!("{{ {} }}", self.join(&statements, " "));
        self.push(Kind::Block, text, statements)
    }

    pub fn field(&mut self, name: &str) -> NodeId {
        let text = match self.language {
            Language::Php | Language::Blade => format!("private ${name};"),
            _ => format!("private {name};"),
        };
        self.named(Kind::FieldDecl, name, text, Vec::new())
    }

    pub fn method(&mut self, name: &str, statements: Vec<NodeId>) -> NodeId {
        let body = self.block(statements);
        let text = format!("{name}() {}", self.text_of(body));
        self.named(Kind::MethodDecl, name, text, vec![body])
    }

    pub fn class(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let text = format!("class {name} {{ {} }}", self.join(&members, " "));
        self.named(Kind::ClassDecl, name, text, members)
    }

    pub fn file(&mut self, items: Vec<NodeId>) -> NodeId {
        let text = self.join(&items, "\n");
        self.push(Kind::File, text, items)
    }

    /// Link parents and validate the node table.
    pub fn finish(self, root: NodeId) -> Result<SyntaxTree> {
        SyntaxTree::from_nodes(self.path, self.language, root, self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_php_operators() {
        let mut b = TreeBuilder::new(Language::Php);
        let key = b.string("otp");
        let val = b.ident("$otp");
        let pair = b.pair(key, val);
        let arr = b.array(vec![pair]);
        let call = b.static_call("User", "create", vec![arr]);
        assert_eq!(b.text_of(call), "User::create(['otp' => $otp])");
    }

    #[test]
    fn renders_java_operators() {
        let mut b = TreeBuilder::new(Language::Java);
        let recv = b.ident("emailService");
        let to = b.ident("email");
        let call = b.method_call(recv, "sendPasswordResetEmail", vec![to]);
        assert_eq!(b.text_of(call), "emailService.sendPasswordResetEmail(email)");
    }

    #[test]
    fn method_wraps_statements_in_block() {
        let mut b = TreeBuilder::new(Language::Java);
        let x = b.ident("x");
        let stmt = b.statement(x);
        let m = b.method("forgotPassword", vec![stmt]);
        let root = b.file(vec![m]);
        let tree = b.finish(root).unwrap();
        let method = tree.node(m);
        assert_eq!(method.name(), Some("forgotPassword"));
        let stmts: Vec<_> = method.statements().map(|s| s.text()).collect();
        assert_eq!(stmts, vec!["x;"]);
    }
}
