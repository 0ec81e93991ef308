use super::{Ast, NodeKind, NodeRef};

/// Query API for common tree traversal patterns
pub struct AstQuery;

impl AstQuery {
    /// Walk a subtree in pre-order, parents before children
    pub fn walk<'a, F>(node: NodeRef<'a>, visitor: &mut F)
    where
        F: FnMut(NodeRef<'a>),
    {
        visitor(node);
        for child in node.children() {
            Self::walk(child, visitor);
        }
    }

    /// All nodes of a subtree matching a predicate, in pre-order
    pub fn find<'a, F>(node: NodeRef<'a>, predicate: F) -> Vec<NodeRef<'a>>
    where
        F: Fn(NodeRef<'a>) -> bool,
    {
        let mut found = Vec::new();
        Self::walk(node, &mut |n| {
            if predicate(n) {
                found.push(n);
            }
        });
        found
    }

    /// Declarations owned directly by a program or type node
    pub fn declarations(container: NodeRef<'_>) -> Vec<NodeRef<'_>> {
        container
            .children()
            .filter(|child| child.kind().is_declaration())
            .collect()
    }

    /// Number of opaque nodes anywhere in the tree
    pub fn opaque_count(ast: &Ast) -> usize {
        Self::find(ast.root(), |n| n.is_opaque()).len()
    }

    /// Opaque nodes at declaration level (program or type members)
    pub fn opaque_declarations(ast: &Ast) -> Vec<NodeRef<'_>> {
        Self::find(ast.root(), |n| {
            n.is_opaque()
                && n.parent().is_some_and(|p| {
                    matches!(p.kind(), NodeKind::Program | NodeKind::Type(_))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;
    use crate::error::Span;

    #[test]
    fn test_walk_is_preorder() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let outer = builder.add(root, NodeKind::Block, Span::default());
        builder.add(outer, NodeKind::Return, Span::default());
        builder.add(
            root,
            NodeKind::Opaque {
                text: "???".into(),
            },
            Span::default(),
        );
        let ast = builder.finish();

        let mut names = Vec::new();
        AstQuery::walk(ast.root(), &mut |n| names.push(n.kind().name()));
        assert_eq!(names, vec!["program", "block", "return", "opaque"]);
        assert_eq!(AstQuery::opaque_count(&ast), 1);
        assert_eq!(AstQuery::opaque_declarations(&ast).len(), 1);
        assert!(AstQuery::declarations(ast.root()).is_empty());
    }
}
