//! Document envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use super::DocumentMetadata;

/// Lightweight first-pass deserializer that reads only the header fields.
///
/// Used during two-pass loading: first check `apiVersion` / `kind` and pick
/// up the document id for error context, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
}
