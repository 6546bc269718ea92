//! Structural validation of model documents with located errors and
//! suggestions.
//!
//! The evaluator trusts its input; the loader runs these checks before a
//! document is registered. Returns a [`ValidationResult`] with errors
//! (block registration) and warnings (advisory).

mod document_checks;
mod model_checks;
mod predicate_checks;

pub mod fuzzy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ModelDocument;

// ── Findings ────────────────────────────────────────────────────────

/// Outcome of validating one document.
///
/// `valid` is false as soon as one error is recorded; warnings never block
/// registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

/// One located problem in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// JSON-path-like location, e.g. `"models[0].TreeModel.node.nodes[1]"`.
    /// Empty for the document root.
    pub path: String,
    pub message: String,
    /// "Did you mean …?" hint for misspelled names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "{}: {}", path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Severity {
    Error,
    Warning,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn record(
        &mut self,
        severity: Severity,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        let finding = Finding {
            path: path.into(),
            message: message.into(),
            suggestion,
        };
        match severity {
            Severity::Error => {
                self.valid = false;
                self.errors.push(finding);
            }
            Severity::Warning => self.warnings.push(finding),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Error, path, message, None);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.record(Severity::Error, path, message, Some(suggestion.into()));
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Warning, path, message, None);
    }

    pub(crate) fn warn_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.record(Severity::Warning, path, message, suggestion);
    }

    /// All errors on one line, as carried by `LoadError::Validation`.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(Finding::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`ModelDocument`].
///
/// `max_depth` is the nesting bound the evaluator will enforce; deeper
/// structures are reported here so they never reach evaluation.
pub fn validate_document(doc: &ModelDocument, max_depth: usize) -> ValidationResult {
    let mut result = ValidationResult::new();
    document_checks::validate_header(doc, &mut result);
    document_checks::validate_model_names(doc, &mut result);
    model_checks::validate_models(doc, max_depth, &mut result);
    result
}

/// Parse raw YAML and validate. Parse errors are reported as a root error.
pub fn validate_yaml(yaml: &str, max_depth: usize) -> ValidationResult {
    match crate::schema::yaml::from_str::<ModelDocument>(yaml) {
        Ok(doc) => validate_document(&doc, max_depth),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}
