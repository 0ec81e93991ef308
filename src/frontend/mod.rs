//! Source extraction front-ends
//!
//! Every source language is an instance of the same extractor driven by its
//! own [`SyntaxTable`] and [`SourceAliases`].

pub mod body;
pub mod extract;
pub mod scan;
pub mod strip;
pub mod syntax;
pub mod typetext;

pub use extract::Extraction;
pub use syntax::SyntaxTable;

use crate::error::Result;
use crate::mapping::{MappingTable, SourceAliases};

/// Raw text to canonical AST for one source language
pub trait Frontend: Send + Sync {
    /// Canonical tag of the language
    fn language(&self) -> &str;

    /// File extensions without the dot
    fn extensions(&self) -> &[&'static str];

    /// Best-effort extraction; never fails as a whole
    fn extract(&self, source: &str) -> Extraction;
}

/// Front-end built from a syntax table and an alias table
#[derive(Debug)]
pub struct TableFrontend {
    syntax: SyntaxTable,
    aliases: SourceAliases,
}

impl TableFrontend {
    pub fn new(syntax: SyntaxTable, aliases: SourceAliases) -> Self {
        Self { syntax, aliases }
    }

    /// The built-in front-end for `tag`
    pub fn for_language(tag: &str, mapping: &MappingTable) -> Result<Self> {
        let syntax = SyntaxTable::for_language(tag)?;
        let aliases = mapping.source(tag)?.clone();
        Ok(Self::new(syntax, aliases))
    }
}

impl Frontend for TableFrontend {
    fn language(&self) -> &str {
        self.syntax.language
    }

    fn extensions(&self) -> &[&'static str] {
        self.syntax.extensions
    }

    fn extract(&self, source: &str) -> Extraction {
        extract::extract(&self.syntax, &self.aliases, source)
    }
}

/// Tags of every built-in front-end
pub const BUILTIN: &[&str] = &["rust", "python", "java", "go", "typescript", "javascript", "kotlin", "csharp"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_frontend_builds() {
        let mapping = MappingTable::builtin();
        for tag in BUILTIN {
            let frontend = TableFrontend::for_language(tag, &mapping).expect("frontend");
            assert_eq!(frontend.language(), *tag);
            assert!(!frontend.extensions().is_empty());
        }
    }

    #[test]
    fn test_empty_source_gives_empty_program() {
        let mapping = MappingTable::builtin();
        let frontend = TableFrontend::for_language("go", &mapping).expect("frontend");
        let extraction = frontend.extract("");
        assert_eq!(extraction.ast.root().child_count(), 0);
        assert!(extraction.diagnostics.is_empty());
    }
}
