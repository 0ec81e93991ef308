//! Double-dispatch visitation over [`NodeRef`]s
//!
//! Every method defaults to an `UnsupportedConstruct` error so a visitor that
//! forgets a kind fails loudly instead of skipping it.

use super::{NodeKind, NodeRef};
use crate::error::{ConvertError, Result};

fn unhandled(node: NodeRef<'_>) -> ConvertError {
    ConvertError::unsupported_construct(node.kind().name()).with_span(node.span())
}

pub trait Visitor<'a> {
    type Output;

    fn visit_program(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_function(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_field(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_parameter(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_block(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_if(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_while(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_for(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_return(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_assign(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_binary(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_unary(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_call(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_field_access(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_literal(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_identifier(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_self(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }

    fn visit_opaque(&mut self, node: NodeRef<'a>) -> Result<Self::Output> {
        Err(unhandled(node))
    }
}

impl<'a> NodeRef<'a> {
    /// Call the visitor method matching this node's kind
    pub fn accept<V>(self, visitor: &mut V) -> Result<V::Output>
    where
        V: Visitor<'a> + ?Sized,
    {
        match self.kind() {
            NodeKind::Program => visitor.visit_program(self),
            NodeKind::Function(_) => visitor.visit_function(self),
            NodeKind::Type(_) => visitor.visit_type(self),
            NodeKind::Field(_) => visitor.visit_field(self),
            NodeKind::Parameter(_) => visitor.visit_parameter(self),
            NodeKind::Block => visitor.visit_block(self),
            NodeKind::If => visitor.visit_if(self),
            NodeKind::While => visitor.visit_while(self),
            NodeKind::For { .. } => visitor.visit_for(self),
            NodeKind::Return => visitor.visit_return(self),
            NodeKind::Assign { .. } => visitor.visit_assign(self),
            NodeKind::Binary { .. } => visitor.visit_binary(self),
            NodeKind::Unary { .. } => visitor.visit_unary(self),
            NodeKind::Call => visitor.visit_call(self),
            NodeKind::FieldAccess { .. } => visitor.visit_field_access(self),
            NodeKind::Literal { .. } => visitor.visit_literal(self),
            NodeKind::Identifier { .. } => visitor.visit_identifier(self),
            NodeKind::SelfRef => visitor.visit_self(self),
            NodeKind::Opaque { .. } => visitor.visit_opaque(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, Literal};
    use crate::error::{ErrorKind, Span};

    struct LiteralsOnly;

    impl<'a> Visitor<'a> for LiteralsOnly {
        type Output = String;

        fn visit_literal(&mut self, node: NodeRef<'a>) -> Result<String> {
            match node.kind() {
                NodeKind::Literal {
                    value: Literal::Int(n),
                } => Ok(n.to_string()),
                _ => Ok(String::new()),
            }
        }
    }

    #[test]
    fn test_dispatch_reaches_kind_method() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        builder.add(
            root,
            NodeKind::Literal {
                value: Literal::Int(42),
            },
            Span::default(),
        );
        let ast = builder.finish();

        let literal = ast.root().child(0).expect("literal");
        assert_eq!(literal.accept(&mut LiteralsOnly).expect("handled"), "42");
    }

    #[test]
    fn test_unimplemented_method_reports_unsupported_construct() {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        builder.add(root, NodeKind::Block, Span::default());
        let ast = builder.finish();

        let err = ast
            .root()
            .child(0)
            .expect("block")
            .accept(&mut LiteralsOnly)
            .expect_err("blocks are not handled");
        assert_eq!(err.kind, ErrorKind::UnsupportedConstruct);
        assert!(err.message.contains("block"));
    }
}
