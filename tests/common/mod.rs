#![allow(dead_code)]

pub mod error_assertions;
pub mod snapshot_utils;

use polyport::{convert, Conversion, ConversionRequest, Options, Registry};

/// Every built-in target
pub const TARGETS: &[&str] = &["rust", "go", "python", "typescript", "java", "kotlin"];

/// Options that keep emitted text free of the generated-file banner
pub fn quiet_options() -> Options {
    Options::new().with(polyport::config::EMIT_HEADER, false)
}

/// Convert `source` with the built-in registry and no banner
pub fn convert_source(source: &str, from: &str, to: &str) -> Conversion {
    convert_with(source, from, to, quiet_options())
}

pub fn convert_with(source: &str, from: &str, to: &str, options: Options) -> Conversion {
    let registry = Registry::builtin();
    let request = ConversionRequest::new(source, from, to).with_options(options);
    convert(&registry, &request).unwrap_or_else(|e| panic!("{} -> {} failed: {}", from, to, e))
}

/// Convert through a caller-built registry, without the banner
pub fn convert_with_registry(registry: &Registry, source: &str, from: &str, to: &str) -> Conversion {
    let request = ConversionRequest::new(source, from, to).with_options(quiet_options());
    convert(registry, &request).unwrap_or_else(|e| panic!("{} -> {} failed: {}", from, to, e))
}

/// Convert `source` into every built-in target
pub fn convert_everywhere(source: &str, from: &str) -> Vec<(&'static str, Conversion)> {
    TARGETS.iter().map(|to| (*to, convert_source(source, from, to))).collect()
}

/// Number of lines carrying a marker comment with `label`
pub fn marker_count(text: &str, label: &str) -> usize {
    let needle = format!(" {}:", label);
    text.lines().filter(|line| line.contains(&needle)).count()
}

/// Assert `text` contains `needle`, showing the whole text otherwise
pub fn assert_contains(text: &str, needle: &str) {
    assert!(text.contains(needle), "expected to find:\n{}\n--- in ---\n{}", needle, text);
}
