//! Construct and type mapping tables
//!
//! A [`MappingTable`] is plain data: source alias tables keyed by source
//! language and target profiles keyed by target language. Adding a language
//! means adding entries, not code paths.

pub mod capabilities;
pub mod source_types;
pub mod target_types;

pub use capabilities::Capabilities;
pub use source_types::{Alias, SourceAliases};
pub use target_types::{CallableRule, Rule, TargetTypeRules};

use crate::error::{ConvertError, Result};
use std::collections::BTreeMap;

/// Everything a back-end needs to know about its own language
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub types: TargetTypeRules,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    sources: BTreeMap<String, SourceAliases>,
    targets: BTreeMap<String, TargetProfile>,
}

impl MappingTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for every built-in language
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.add_source("rust", SourceAliases::rust());
        table.add_source("python", SourceAliases::python());
        table.add_source("java", SourceAliases::java());
        table.add_source("go", SourceAliases::go());
        table.add_source("typescript", SourceAliases::typescript());
        table.add_source("javascript", SourceAliases::typescript());
        table.add_source("kotlin", SourceAliases::kotlin());
        table.add_source("csharp", SourceAliases::csharp());

        let targets = [
            ("rust", TargetTypeRules::rust(), Capabilities::rust()),
            ("go", TargetTypeRules::go(), Capabilities::go()),
            ("python", TargetTypeRules::python(), Capabilities::python()),
            ("typescript", TargetTypeRules::typescript(), Capabilities::typescript()),
            ("java", TargetTypeRules::java(), Capabilities::java()),
            ("kotlin", TargetTypeRules::kotlin(), Capabilities::kotlin()),
        ];
        for (tag, types, capabilities) in targets {
            table.add_target(tag, TargetProfile { types, capabilities });
        }
        table
    }

    pub fn add_source(&mut self, tag: &str, aliases: SourceAliases) {
        self.sources.insert(tag.to_string(), aliases);
    }

    pub fn add_target(&mut self, tag: &str, profile: TargetProfile) {
        self.targets.insert(tag.to_string(), profile);
    }

    pub fn source(&self, tag: &str) -> Result<&SourceAliases> {
        self.sources
            .get(tag)
            .ok_or_else(|| ConvertError::unsupported_language(tag).with_note("no source alias table"))
    }

    pub fn target(&self, tag: &str) -> Result<&TargetProfile> {
        self.targets
            .get(tag)
            .ok_or_else(|| ConvertError::unsupported_language(tag).with_note("no target mapping rules"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtin_covers_all_languages() {
        let table = MappingTable::builtin();
        for source in ["rust", "python", "java", "go", "typescript", "javascript", "kotlin", "csharp"] {
            assert!(table.source(source).is_ok(), "{}", source);
        }
        for target in ["rust", "go", "python", "typescript", "java", "kotlin"] {
            assert!(table.target(target).is_ok(), "{}", target);
        }
    }

    #[test]
    fn test_unknown_target_is_unsupported_language() {
        let err = MappingTable::builtin().target("cobol").expect_err("no cobol");
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
    }
}
