//! Core [`ModelLoader`] struct: filesystem-backed document loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use sylva_core::config::DEFAULT_MAX_DEPTH;
use sylva_core::EngineConfig;
use tracing::{debug, info, warn};

use crate::registry::ModelRegistry;
use crate::schema::{yaml, DocumentEnvelope, ModelDocument, API_VERSION, DOCUMENT_KIND};
use crate::validation::validate_document;

use super::error::{LoadError, LoadResult, LoadStatus, Result};
use super::watcher::handle_fs_event;

/// A registered document and the file it came from, if any.
#[derive(Debug, Clone)]
pub(super) struct LoadedDocument {
    pub(super) path: Option<PathBuf>,
    pub(super) registry: Arc<ModelRegistry>,
}

pub(super) type DocumentMap = Arc<RwLock<HashMap<String, LoadedDocument>>>;

/// Filesystem-backed model loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, parses them
/// into [`ModelDocument`]s via two-pass deserialization, validates them and
/// keeps one [`ModelRegistry`] per document keyed by `metadata.id`.
pub struct ModelLoader {
    /// Root directory containing model documents.
    models_dir: PathBuf,
    /// Nesting bound enforced by validation and by every registry built here.
    max_depth: usize,
    /// Registered documents keyed by `metadata.id`.
    documents: DocumentMap,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl ModelLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(models_dir: PathBuf) -> Self {
        if !models_dir.exists() {
            if let Err(e) = fs::create_dir_all(&models_dir) {
                warn!(path = %models_dir.display(), error = %e, "failed to create models directory");
            }
        }
        Self {
            models_dir,
            max_depth: DEFAULT_MAX_DEPTH,
            documents: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Loader for the configured models directory and depth guard.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.models_dir.clone()).with_max_depth(config.max_depth)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Get the models directory path.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Parse and validate a YAML document without registering it.
    pub fn load_str(&self, yaml: &str) -> Result<ModelDocument> {
        parse_yaml(yaml, self.max_depth)
    }

    /// Parse and validate a single file without registering it.
    ///
    /// `.json` files are read as JSON, everything else as YAML.
    pub fn load_file(&self, path: &Path) -> Result<ModelDocument> {
        read_document(path, self.max_depth)
    }

    /// Recursively scan the models directory and register every document.
    ///
    /// Dotfiles (filenames starting with `.`) and non-YAML files are skipped,
    /// as are documents with `metadata.enabled: false`.
    /// Parse errors are reported per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.models_dir, &mut results)?;
        let loaded = results.iter().filter(|r| r.is_loaded()).count();
        info!(path = %self.models_dir.display(), loaded, files = results.len(), "scanned models directory");
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Directory order is platform dependent.
        paths.sort();

        for path in paths {
            if is_dotfile(&path) {
                if path.is_file() {
                    results.push(skipped(path, "dotfile"));
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_yaml(&path) {
                results.push(skipped(path, "not a YAML file"));
                continue;
            }

            let status = match self.load_file(&path) {
                Ok(doc) if !doc.metadata.enabled => {
                    debug!(document_id = %doc.id(), path = %path.display(), "document disabled");
                    LoadStatus::Skipped {
                        reason: "disabled".to_string(),
                    }
                }
                Ok(doc) => match self.insert(doc, Some(path.clone())) {
                    Ok(registry) => {
                        info!(document_id = %registry.metadata().id, models = registry.len(), path = %path.display(), "loaded document");
                        LoadStatus::Loaded {
                            document_id: registry.metadata().id.clone(),
                            models: registry.len(),
                        }
                    }
                    Err(e) => failed(&path, e),
                },
                Err(e) => failed(&path, e),
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    // ── Registries ──────────────────────────────────────────────────

    /// Register an in-memory document (not backed by a file).
    pub fn register(&self, doc: ModelDocument) -> Result<Arc<ModelRegistry>> {
        let doc = check_document(doc, self.max_depth)?;
        self.insert(doc, None)
    }

    fn insert(&self, doc: ModelDocument, path: Option<PathBuf>) -> Result<Arc<ModelRegistry>> {
        let registry = build_registry(doc, self.max_depth)?;
        Ok(insert_registry(&self.documents, registry, path))
    }

    /// The registry of document `id`.
    pub fn registry(&self, id: &str) -> Option<Arc<ModelRegistry>> {
        self.documents
            .read()
            .expect("documents lock poisoned")
            .get(id)
            .map(|d| Arc::clone(&d.registry))
    }

    /// The registry of the first document (by id) that defines model `name`.
    pub fn find_model(&self, name: &str) -> Option<Arc<ModelRegistry>> {
        let documents = self.documents.read().expect("documents lock poisoned");
        let mut ids: Vec<&String> = documents.keys().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| documents.get(id))
            .find(|d| d.registry.contains(name))
            .map(|d| Arc::clone(&d.registry))
    }

    /// Registered document ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .read()
            .expect("documents lock poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("documents lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Validate and atomically write a document to `<id>.yml`, then register it.
    ///
    /// Writes to a `.tmp` file first, then renames to the final path to
    /// avoid partial writes on crash.
    pub fn write_document(&self, doc: &ModelDocument) -> Result<PathBuf> {
        let doc = check_document(doc.clone(), self.max_depth)?;
        let id = doc.id().to_string();
        let final_path = self.models_dir.join(format!("{id}.yml"));
        let tmp_path = self.models_dir.join(format!(".{id}.tmp"));

        let yaml = doc.to_yaml()?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(document_id = %id, path = %final_path.display(), "wrote document file");

        self.insert(doc, Some(final_path.clone()))?;
        Ok(final_path)
    }

    /// Delete a document file by id and unregister it.
    pub fn delete_document(&self, id: &str) -> Result<()> {
        let known_path = self
            .documents
            .read()
            .expect("documents lock poisoned")
            .get(id)
            .and_then(|d| d.path.clone());

        let candidates = known_path.into_iter().chain([
            self.models_dir.join(format!("{id}.yml")),
            self.models_dir.join(format!("{id}.yaml")),
        ]);

        let mut removed = false;
        for path in candidates {
            if path.exists() {
                fs::remove_file(&path)?;
                removed = true;
                break;
            }
        }

        if !removed {
            return Err(LoadError::NotFound(id.to_string()));
        }

        self.documents
            .write()
            .expect("documents lock poisoned")
            .remove(id);

        info!(document_id = %id, "deleted document");
        Ok(())
    }

    // ── Hot reload ──────────────────────────────────────────────────

    /// Start a filesystem watcher with 500ms debounce.
    ///
    /// On file create/modify the document is re-parsed and its registry
    /// replaced. On file delete the document is unregistered.
    /// Parse errors are logged as warnings; the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let documents = Arc::clone(&self.documents);
        let max_depth = self.max_depth;

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &documents, max_depth),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.models_dir, RecursiveMode::Recursive)?;

        let _ = watcher
            .configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.models_dir.display(), "watching models directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn documents(&self) -> &DocumentMap {
        &self.documents
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse a YAML document via two-pass deserialization and validate it.
///
/// First pass: deserialize as [`DocumentEnvelope`] to check the header.
/// Second pass: deserialize the full [`ModelDocument`].
pub fn parse_yaml(contents: &str, max_depth: usize) -> Result<ModelDocument> {
    let envelope: DocumentEnvelope = yaml::from_str(contents)?;
    check_envelope(&envelope)?;

    let doc: ModelDocument = yaml::from_str(contents).map_err(|e| {
        LoadError::Validation(format!(
            "failed to parse document '{}': {}",
            envelope.metadata.id, e
        ))
    })?;
    check_document(doc, max_depth)
}

/// JSON counterpart of [`parse_yaml`].
pub fn parse_json(contents: &str, max_depth: usize) -> Result<ModelDocument> {
    let envelope: DocumentEnvelope = serde_json::from_str(contents)?;
    check_envelope(&envelope)?;

    let doc: ModelDocument = serde_json::from_str(contents).map_err(|e| {
        LoadError::Validation(format!(
            "failed to parse document '{}': {}",
            envelope.metadata.id, e
        ))
    })?;
    check_document(doc, max_depth)
}

pub(super) fn read_document(path: &Path, max_depth: usize) -> Result<ModelDocument> {
    let contents = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        parse_json(&contents, max_depth)
    } else {
        parse_yaml(&contents, max_depth)
    }
}

fn check_envelope(envelope: &DocumentEnvelope) -> Result<()> {
    if envelope.api_version != API_VERSION {
        return Err(LoadError::Validation(format!(
            "unsupported apiVersion '{}', expected '{}'",
            envelope.api_version, API_VERSION
        )));
    }
    if envelope.kind != DOCUMENT_KIND {
        return Err(LoadError::Validation(format!(
            "unsupported kind '{}', expected '{}'",
            envelope.kind, DOCUMENT_KIND
        )));
    }
    if envelope.metadata.id.is_empty() {
        return Err(LoadError::Validation(
            "document metadata.id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_document(doc: ModelDocument, max_depth: usize) -> Result<ModelDocument> {
    let report = validate_document(&doc, max_depth);
    for warning in &report.warnings {
        debug!(document_id = %doc.id(), path = %warning.path, message = %warning.message, "validation warning");
    }
    if !report.valid {
        return Err(LoadError::Validation(format!(
            "document '{}' is invalid: {}",
            doc.id(),
            report.error_summary()
        )));
    }
    Ok(doc)
}

pub(super) fn build_registry(doc: ModelDocument, max_depth: usize) -> Result<ModelRegistry> {
    Ok(ModelRegistry::from_document(doc)?.with_max_depth(max_depth))
}

/// Insert or replace a registry, returning the shared handle.
pub(super) fn insert_registry(
    documents: &DocumentMap,
    registry: ModelRegistry,
    path: Option<PathBuf>,
) -> Arc<ModelRegistry> {
    let registry = Arc::new(registry);
    let id = registry.metadata().id.clone();
    let mut guard = documents.write().expect("documents lock poisoned");
    if let Some(path) = &path {
        // A file registers at most one document; its id may have changed.
        let stale: Vec<String> = guard
            .iter()
            .filter(|(other, doc)| **other != id && doc.path.as_ref() == Some(path))
            .map(|(other, _)| other.clone())
            .collect();
        for other in stale {
            guard.remove(&other);
            info!(document_id = %other, renamed_to = %id, path = %path.display(), "document id changed, dropping old id");
        }
    }
    guard.insert(
        id,
        LoadedDocument {
            path,
            registry: Arc::clone(&registry),
        },
    );
    registry
}

pub(super) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

pub(super) fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}

fn failed(path: &Path, error: LoadError) -> LoadStatus {
    warn!(path = %path.display(), error = %error, "failed to load document file");
    LoadStatus::Failed {
        error: error.to_string(),
    }
}
