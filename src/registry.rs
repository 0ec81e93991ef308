//! Binding of language tags to front-ends and back-ends
//!
//! A [`Registry`] is an explicit value handed to every job; it holds no
//! per-job state and is shared read-only once built.

use crate::ast::Ast;
use crate::backend::{self, Backend, Emission};
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::frontend::{self, Frontend, TableFrontend};
use crate::mapping::MappingTable;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Short and alternative spellings of the canonical tags
const ALIASES: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("python3", "python"),
    ("golang", "go"),
    ("ts", "typescript"),
    ("js", "javascript"),
    ("kt", "kotlin"),
    ("cs", "csharp"),
    ("c#", "csharp"),
];

/// Canonical tag for a user-supplied language name
pub fn canonical_tag(tag: &str) -> String {
    let lowered = tag.trim().to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lowered)
}

pub struct Registry {
    mapping: Arc<MappingTable>,
    frontends: BTreeMap<String, Arc<dyn Frontend>>,
    backends: BTreeMap<String, Arc<dyn Backend>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("frontends", &self.frontends.keys().collect::<Vec<_>>())
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// A registry with no languages over `mapping`
    pub fn empty(mapping: MappingTable) -> Self {
        Self {
            mapping: Arc::new(mapping),
            frontends: BTreeMap::new(),
            backends: BTreeMap::new(),
        }
    }

    /// Every built-in front-end and back-end over the built-in mapping table
    pub fn builtin() -> Self {
        let mut registry = Self::empty(MappingTable::builtin());
        for tag in frontend::BUILTIN {
            match TableFrontend::for_language(tag, &registry.mapping) {
                Ok(frontend) => registry.register_frontend(Arc::new(frontend)),
                Err(e) => log::warn!("built-in front-end '{}' unavailable: {}", tag, e),
            }
        }
        for tag in backend::BUILTIN {
            match backend::builtin(tag) {
                Ok(backend) => registry.register_backend(backend),
                Err(e) => log::warn!("built-in back-end '{}' unavailable: {}", tag, e),
            }
        }
        registry
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Add a front-end, replacing any registered under the same tag
    pub fn register_frontend(&mut self, frontend: Arc<dyn Frontend>) {
        let tag = canonical_tag(frontend.language());
        log::debug!("registering front-end '{}'", tag);
        self.frontends.insert(tag, frontend);
    }

    /// Add a back-end, replacing any registered under the same tag
    pub fn register_backend(&mut self, backend: Arc<dyn Backend>) {
        let tag = canonical_tag(backend.language());
        log::debug!("registering back-end '{}'", tag);
        self.backends.insert(tag, backend);
    }

    pub fn frontend(&self, tag: &str) -> Result<Arc<dyn Frontend>> {
        let canonical = canonical_tag(tag);
        self.frontends.get(&canonical).cloned().ok_or_else(|| {
            ConvertError::unsupported_language(tag)
                .with_note("no front-end is registered for this language")
                .with_help(format!("registered sources: {}", self.source_languages().join(", ")))
        })
    }

    pub fn backend(&self, tag: &str) -> Result<Arc<dyn Backend>> {
        let canonical = canonical_tag(tag);
        self.backends.get(&canonical).cloned().ok_or_else(|| {
            ConvertError::unsupported_language(tag)
                .with_note("no back-end is registered for this language")
                .with_help(format!("registered targets: {}", self.target_languages().join(", ")))
        })
    }

    /// Front-end claiming a file extension, with or without the leading dot
    pub fn frontend_for_extension(&self, extension: &str) -> Option<Arc<dyn Frontend>> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.frontends
            .values()
            .find(|frontend| frontend.extensions().iter().any(|e| *e == extension))
            .cloned()
    }

    pub fn source_languages(&self) -> Vec<&str> {
        self.frontends.keys().map(String::as_str).collect()
    }

    pub fn target_languages(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Emit one AST to several targets in parallel, in the order given
    pub fn emit_all(&self, ast: &Ast, targets: &[&str], settings: &Settings) -> Vec<(String, Result<Emission>)> {
        targets
            .par_iter()
            .map(|tag| {
                let emission = self
                    .backend(tag)
                    .and_then(|backend| backend.emit(ast, settings, &self.mapping));
                (canonical_tag(tag), emission)
            })
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_aliases_are_case_insensitive() {
        assert_eq!(canonical_tag("PY"), "python");
        assert_eq!(canonical_tag("C#"), "csharp");
        assert_eq!(canonical_tag(" Golang "), "go");
        assert_eq!(canonical_tag("java"), "java");
    }

    #[test]
    fn test_builtin_languages() {
        let registry = Registry::builtin();
        assert_eq!(registry.source_languages().len(), frontend::BUILTIN.len());
        assert_eq!(registry.target_languages(), vec!["go", "java", "kotlin", "python", "rust", "typescript"]);
        assert!(registry.frontend("ts").is_ok());
        assert!(registry.backend("kt").is_ok());
    }

    #[test]
    fn test_unknown_tag_fails_without_fallback() {
        let registry = Registry::builtin();
        let err = registry.frontend("cobol").err().expect("no cobol front-end");
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
        // C# is a source language only
        let err = registry.backend("csharp").err().expect("no csharp back-end");
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn test_extension_lookup() {
        let registry = Registry::builtin();
        let frontend = registry.frontend_for_extension(".py").expect("python");
        assert_eq!(frontend.language(), "python");
        assert_eq!(registry.frontend_for_extension("KT").map(|f| f.language().to_string()), Some("kotlin".to_string()));
        assert!(registry.frontend_for_extension("cbl").is_none());
    }

    #[test]
    fn test_registering_replaces_only_that_tag() {
        let mut registry = Registry::builtin();
        let before = registry.backend("go").expect("go");
        registry.register_backend(Arc::new(backend::go::GoBackend));
        let after = registry.backend("go").expect("go");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(registry.target_languages().len(), backend::BUILTIN.len());
    }

    #[test]
    fn test_emit_all_keeps_target_order() {
        let registry = Registry::builtin();
        let frontend = registry.frontend("python").expect("python");
        let ast = frontend.extract("def add(a: int, b: int) -> int:\n    return a + b\n").ast;
        let results = registry.emit_all(&ast, &["rust", "go", "cobol"], &Settings::default());
        let tags: Vec<&str> = results.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(tags, vec!["rust", "go", "cobol"]);
        assert!(results[0].1.as_ref().is_ok_and(|e| e.text.contains("fn add(a: i64, b: i64) -> i64")));
        assert!(results[2].1.is_err());
    }
}
