//! Collection of non-fatal problems found while converting one file

use super::{ConvertError, ErrorKind};
use serde::Serialize;
use std::fmt;

/// Errors and warnings gathered for a single conversion.
///
/// Parse errors (opaque spans) and translation errors (placeholders) land in
/// `errors`; informational notes about restructured constructs land in
/// `warnings`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    errors: Vec<ConvertError>,
    warnings: Vec<ConvertError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ConvertError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ConvertError) {
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Number of recorded errors of one kind
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    pub fn errors(&self) -> &[ConvertError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ConvertError] {
        &self.warnings
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "error: {}", error)?;
        }

        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }

        if !self.is_empty() {
            write!(
                f,
                "\n{} error(s), {} warning(s)",
                self.error_count(),
                self.warning_count()
            )?;
        }

        Ok(())
    }
}
