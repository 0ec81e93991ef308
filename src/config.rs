//! Conversion options
//!
//! Options are a flat map of named keys to booleans, strings or integers.
//! Unknown keys are ignored; absent or wrongly-typed keys fall back to the
//! documented defaults. Back-ends read the typed [`Settings`] snapshot.

use serde::Serialize;
use std::collections::BTreeMap;

/// Carry documentation comments and opaque source text into the output
pub const PRESERVE_COMMENTS: &str = "preserve-comments";
/// Emit doc comments on generated accessors and constructors
pub const GENERATE_DOC_COMMENTS: &str = "generate-documentation-comments";
/// Spaces per indentation level
pub const INDENT_WIDTH: &str = "indent-width";
/// Emit type annotations in gradually typed targets
pub const EMIT_TYPE_ANNOTATIONS: &str = "emit-type-annotations";
/// Emit getters, setters and a constructor where properties are not native
pub const GENERATE_ACCESSORS: &str = "generate-accessors";
/// Package name for targets that declare one
pub const PACKAGE_NAME: &str = "package-name";
/// Emit the generated-file banner
pub const EMIT_HEADER: &str = "emit-header";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("options must be a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller-supplied options as given
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object such as `{"indent-width": 2}`.
    ///
    /// Values that are not booleans, integers or strings are skipped.
    pub fn from_json_str(text: &str) -> Result<Self, OptionsError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::Bool(flag) => OptionValue::Bool(flag),
                    serde_json::Value::Number(number) => OptionValue::Int(number.as_i64()?),
                    serde_json::Value::String(text) => OptionValue::Str(text),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();
        Ok(Self { values })
    }

    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(OptionValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(OptionValue::Int(value)) => *value,
            _ => default,
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(OptionValue::Str(value)) => value,
            _ => default,
        }
    }

    /// Resolve every documented key against its default
    pub fn resolve(&self) -> Settings {
        let defaults = Settings::default();
        let indent = self.int_or(INDENT_WIDTH, defaults.indent_width as i64);
        Settings {
            preserve_comments: self.bool_or(PRESERVE_COMMENTS, defaults.preserve_comments),
            doc_comments: self.bool_or(GENERATE_DOC_COMMENTS, defaults.doc_comments),
            indent_width: usize::try_from(indent)
                .ok()
                .filter(|width| (1..=16).contains(width))
                .unwrap_or(defaults.indent_width),
            type_annotations: self.bool_or(EMIT_TYPE_ANNOTATIONS, defaults.type_annotations),
            accessors: self.bool_or(GENERATE_ACCESSORS, defaults.accessors),
            package_name: self.str_or(PACKAGE_NAME, &defaults.package_name).to_string(),
            header: self.bool_or(EMIT_HEADER, defaults.header),
        }
    }
}

/// Typed view of [`Options`] with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub preserve_comments: bool,
    pub doc_comments: bool,
    pub indent_width: usize,
    pub type_annotations: bool,
    pub accessors: bool,
    pub package_name: String,
    pub header: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preserve_comments: true,
            doc_comments: false,
            indent_width: 4,
            type_annotations: true,
            accessors: true,
            package_name: "main".to_string(),
            header: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_keys_use_defaults() {
        assert_eq!(Options::new().resolve(), Settings::default());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let options = Options::from_json_str(r#"{"shiny-new-flag": {"nested": 1}, "indent-width": 2}"#)
            .expect("valid options");
        let settings = options.resolve();
        assert_eq!(settings.indent_width, 2);
        assert!(settings.preserve_comments);
    }

    #[test]
    fn test_wrongly_typed_value_falls_back() {
        let options = Options::new()
            .with(PRESERVE_COMMENTS, "yes")
            .with(INDENT_WIDTH, -3i64);
        let settings = options.resolve();
        assert!(settings.preserve_comments);
        assert_eq!(settings.indent_width, 4);
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        assert!(Options::from_json_str("[1, 2]").is_err());
    }
}
