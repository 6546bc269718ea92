//! Model document container and accessors.

use serde::{Deserialize, Serialize};
use sylva_core::{DataDictionary, FieldSpec};

use super::{DocumentMetadata, Model};

pub const API_VERSION: &str = "v1";
pub const DOCUMENT_KIND: &str = "ModelDocument";

/// One loaded document: the field dictionary plus its top-level models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub data_dictionary: DataDictionary,
    #[serde(default)]
    pub models: Vec<Model>,
}

impl ModelDocument {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: DOCUMENT_KIND.to_string(),
            metadata,
            data_dictionary: DataDictionary::new(),
            models: Vec::new(),
        }
    }

    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.data_dictionary = self.data_dictionary.with_field(spec);
        self
    }

    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.models.push(model.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Find a top-level model by name.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name() == name)
    }

    /// Serialize this document to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        super::yaml::to_string(self)
    }

    /// Serialize this document to JSON.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
