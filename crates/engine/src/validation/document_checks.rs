//! Header and document-level checks: apiVersion, kind, id and model names.

use std::collections::HashSet;

use crate::schema::{ModelDocument, API_VERSION, DOCUMENT_KIND};

use super::fuzzy::{did_you_mean, fuzzy_match, is_kebab_case};
use super::ValidationResult;

pub(super) fn validate_header(doc: &ModelDocument, result: &mut ValidationResult) {
    if doc.api_version != API_VERSION {
        result.error(
            "apiVersion",
            format!(
                "Unsupported apiVersion '{}', expected '{API_VERSION}'",
                doc.api_version
            ),
        );
    }

    if doc.kind != DOCUMENT_KIND {
        let message = format!("Unknown kind '{}', expected '{DOCUMENT_KIND}'", doc.kind);
        match fuzzy_match(&doc.kind, &[DOCUMENT_KIND][..]) {
            Some(s) => result.error_with_suggestion("kind", message, did_you_mean(s)),
            None => result.error("kind", message),
        }
    }

    let id = &doc.metadata.id;
    if id.is_empty() {
        result.error("metadata.id", "Document id must not be empty");
    } else if !is_kebab_case(id) {
        result.error_with_suggestion(
            "metadata.id",
            format!("Document id '{id}' is not kebab-case"),
            did_you_mean(&to_kebab_case(id)),
        );
    }

    if doc.metadata.name.trim().is_empty() {
        result.warn("metadata.name", "Document name is empty");
    }

    if doc.models.is_empty() {
        result.warn("models", "Document declares no models");
    }
}

pub(super) fn validate_model_names(doc: &ModelDocument, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, model) in doc.models.iter().enumerate() {
        let name = model.name();
        if name.is_empty() {
            result.error(format!("models[{i}]"), "Model name must not be empty");
        } else if !seen.insert(name) {
            result.error(
                format!("models[{i}]"),
                format!("Duplicate model name '{name}'"),
            );
        }
    }
}

fn to_kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_suggestions() {
        assert_eq!(to_kebab_case("IrisTree"), "iris-tree");
        assert_eq!(to_kebab_case("iris_tree v2"), "iris-tree-v2");
        assert_eq!(to_kebab_case("credit.score_"), "credit-score");
    }
}
