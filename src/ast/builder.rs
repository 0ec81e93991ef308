//! Construction API for [`Ast`] values
//!
//! The builder is the only way to create or link nodes. Appending a node
//! that already has a parent detaches it first, so a node can never be owned
//! twice.

use super::{Ast, Node, NodeId, NodeKind};
use crate::error::Span;

#[derive(Debug)]
pub struct AstBuilder {
    source_language: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl AstBuilder {
    /// Start a tree whose root is a `Program` node
    pub fn new(source_language: &str) -> Self {
        let root = Node {
            kind: NodeKind::Program,
            span: Span::default(),
            children: Vec::new(),
            parent: None,
        };
        Self {
            source_language: source_language.to_string(),
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node
    pub fn node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node {
            kind,
            span,
            children: Vec::new(),
            parent: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a node and append it to `parent`
    pub fn add(&mut self, parent: NodeId, kind: NodeKind, span: Span) -> NodeId {
        let id = self.node(kind, span);
        self.append(parent, id);
        id
    }

    /// Append `child` to `parent`, re-parenting it if it is already attached
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "a node cannot own itself");
        if self.is_ancestor(child, parent) {
            // Refuse to create a cycle; the child stays where it was
            log::warn!("ignored append that would make node {:?} its own ancestor", child);
            return;
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` at `index` among `parent`'s children
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.is_ancestor(child, parent) {
            log::warn!("ignored insert that would make node {:?} its own ancestor", child);
            return;
        }
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Deep-copy a subtree into a new detached node
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let span = self.nodes[id.0].span;
        let copy = self.node(kind, span);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.duplicate(child);
            self.append(copy, child_copy);
        }
        copy
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0].span = span;
    }

    /// Remove `child` from its current parent, if any
    pub fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|&id| id != child);
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    fn is_ancestor(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Freeze the tree.
    ///
    /// Nodes not reachable from the root are dropped and the survivors are
    /// renumbered in pre-order, so the finished arena holds exactly one tree.
    pub fn finish(self) -> Ast {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }

        let mut remap = vec![None; self.nodes.len()];
        for (new_index, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(new_index));
        }

        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let nodes = order
            .iter()
            .filter_map(|old| slots[old.0].take())
            .map(|node| Node {
                kind: node.kind,
                span: node.span,
                children: node.children.iter().filter_map(|c| remap[c.0]).collect(),
                parent: node.parent.and_then(|p| remap[p.0]),
            })
            .collect();

        Ast {
            source_language: self.source_language,
            nodes,
            root: NodeId(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    fn ident(builder: &mut AstBuilder, name: &str) -> NodeId {
        builder.node(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            Span::default(),
        )
    }

    #[test]
    fn test_append_reparents_instead_of_duplicating() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let a = builder.add(root, NodeKind::Block, Span::default());
        let b = builder.add(root, NodeKind::Block, Span::default());
        let x = ident(&mut builder, "x");

        builder.append(a, x);
        builder.append(b, x);

        assert!(builder.children_of(a).is_empty());
        assert_eq!(builder.children_of(b), &[x]);
        assert_eq!(builder.parent_of(x), Some(b));
    }

    #[test]
    fn test_append_refuses_cycles() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let outer = builder.add(root, NodeKind::Block, Span::default());
        let inner = builder.add(outer, NodeKind::Block, Span::default());

        builder.append(inner, outer);

        assert_eq!(builder.parent_of(outer), Some(root));
        assert_eq!(builder.children_of(outer), &[inner]);
    }

    #[test]
    fn test_finish_drops_orphans_and_keeps_order() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let _orphan = ident(&mut builder, "lost");
        let block = builder.add(root, NodeKind::Block, Span::default());
        builder.add(
            block,
            NodeKind::Literal {
                value: Literal::Int(1),
            },
            Span::default(),
        );
        let y = ident(&mut builder, "y");
        builder.append(block, y);

        let ast = builder.finish();
        assert_eq!(ast.len(), 4);

        let block = ast.root().child(0).expect("block");
        let kinds: Vec<&str> = block.children().map(|c| c.kind().name()).collect();
        assert_eq!(kinds, vec!["literal", "identifier"]);
        assert_eq!(block.child(1).and_then(|c| c.parent()).map(|p| p.id()), Some(block.id()));
    }
}
