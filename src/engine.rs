//! Conversion jobs
//!
//! A job is a pure function of (input text, source tag, target tag,
//! options). Batches run in parallel with collect-and-continue semantics:
//! every file gets its own result, in input order, and a panic inside one
//! front- or back-end becomes an `InternalError` for that file only.

use crate::ast::query::AstQuery;
use crate::config::Options;
use crate::error::{ConvertError, Diagnostics, ErrorKind, Result};
use crate::frontend::Extraction;
use crate::registry::Registry;
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

/// Input contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub text: String,
    pub language: String,
}

impl SourceFile {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_text: String,
    pub source_language: String,
    pub target_language: String,
    pub options: Options,
}

impl ConversionRequest {
    pub fn new(input_text: impl Into<String>, source_language: &str, target_language: &str) -> Self {
        Self {
            input_text: input_text.into(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            options: Options::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

/// Output contract
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub text: String,
    /// Parse problems followed by translation problems
    pub diagnostics: Diagnostics,
    pub suggested_name: Option<String>,
}

/// Front-end pass only
pub fn extract(registry: &Registry, file: &SourceFile) -> Result<Extraction> {
    let frontend = registry.frontend(&file.language)?;
    Ok(frontend.extract(&file.text))
}

/// Run one job; fails only when a tag has no registered component
pub fn convert(registry: &Registry, request: &ConversionRequest) -> Result<Conversion> {
    // Both tags are checked before any work is done
    let frontend = registry.frontend(&request.source_language)?;
    let backend = registry.backend(&request.target_language)?;
    let settings = request.options.resolve();

    let extraction = frontend.extract(&request.input_text);
    log::debug!(
        "extracted {} node(s) from {} source, {} opaque",
        extraction.ast.len(),
        frontend.language(),
        AstQuery::opaque_count(&extraction.ast)
    );
    let emission = backend.emit(&extraction.ast, &settings, registry.mapping())?;

    let mut diagnostics = extraction.diagnostics;
    diagnostics.extend(emission.diagnostics);
    Ok(Conversion {
        text: emission.text,
        diagnostics,
        suggested_name: backend.suggested_name(&extraction.ast),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Convert every file to `target`; results keep the order of `files`
pub fn convert_batch(
    registry: &Registry,
    files: &[SourceFile],
    target: &str,
    options: &Options,
) -> Vec<Result<Conversion>> {
    let results: Vec<Result<Conversion>> = files
        .par_iter()
        .enumerate()
        .map(|(index, file)| {
            let request = ConversionRequest {
                input_text: file.text.clone(),
                source_language: file.language.clone(),
                target_language: target.to_string(),
                options: options.clone(),
            };
            match panic::catch_unwind(AssertUnwindSafe(|| convert(registry, &request))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::warn!("conversion of file #{} panicked: {}", index, message);
                    Err(ConvertError::new(ErrorKind::InternalError, format!("conversion panicked: {}", message))
                        .with_note(format!("file #{} of the batch ({} source)", index, file.language)))
                }
            }
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    let degraded = results
        .iter()
        .filter(|r| r.as_ref().is_ok_and(|c| c.diagnostics.has_errors()))
        .count();
    log::info!(
        "batch of {} file(s) to {}: {} failed, {} with diagnostics",
        files.len(),
        target,
        failed,
        degraded
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Frontend;
    use std::sync::Arc;

    #[test]
    fn test_convert_merges_diagnostics_and_names_output() {
        let registry = Registry::builtin();
        let request = ConversionRequest::new("def add(a: int, b: int) -> int:\n    return a + b\n", "py", "go");
        let conversion = convert(&registry, &request).expect("conversion");
        assert!(conversion.text.contains("func Add(a int64, b int64) int64 {"));
        assert_eq!(conversion.suggested_name.as_deref(), Some("add.go"));
        assert!(conversion.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_target_is_fatal_to_the_job() {
        let registry = Registry::builtin();
        let request = ConversionRequest::new("def f(): pass\n", "python", "cobol");
        let err = convert(&registry, &request).expect_err("cobol is not a target");
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
    }

    struct Exploding;

    impl Frontend for Exploding {
        fn language(&self) -> &str {
            "exploding"
        }

        fn extensions(&self) -> &[&'static str] {
            &["boom"]
        }

        fn extract(&self, _source: &str) -> Extraction {
            panic!("front-end exploded")
        }
    }

    #[test]
    fn test_panicking_frontend_is_contained() {
        let mut registry = Registry::builtin();
        registry.register_frontend(Arc::new(Exploding));
        let files = vec![
            SourceFile::new("def a(): pass\n", "python"),
            SourceFile::new("anything", "exploding"),
            SourceFile::new("def c(): pass\n", "python"),
        ];
        let results = convert_batch(&registry, &files, "rust", &Options::new());
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().is_ok_and(|c| c.text.contains("fn a()")));
        let err = results[1].as_ref().err().expect("panic recorded");
        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.message.contains("front-end exploded"));
        assert!(results[2].as_ref().is_ok_and(|c| c.text.contains("fn c()")));
    }
}
