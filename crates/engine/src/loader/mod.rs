//! Filesystem model loader with hot-reload via `notify` watcher.
//!
//! Scans the models directory for YAML documents, validates them and keeps
//! one immutable [`ModelRegistry`](crate::registry::ModelRegistry) per
//! document. Reloads swap the registry `Arc`, so evaluations already in
//! flight keep the version they started with.
//! Documents are read via two-pass deserialization (DocumentEnvelope -> ModelDocument).

mod core;
mod error;
mod watcher;


pub use self::core::{parse_json, parse_yaml, ModelLoader};
pub use self::error::{LoadError, LoadResult, LoadStatus, Result};
