//! Filesystem event handler for the notify watcher (hot-reload).

use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{build_registry, insert_registry, is_dotfile, is_yaml, read_document, DocumentMap};

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, documents: &DocumentMap, max_depth: usize) {
    for path in &event.paths {
        // Only YAML documents; dotfiles include our own .tmp files.
        if !is_yaml(path) || is_dotfile(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any) => {
                if path.exists() {
                    reload(path, documents, max_depth);
                } else {
                    // Rename away from this path.
                    remove_by_path(documents, path);
                }
            }
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                remove_by_path(documents, path);
            }
            _ => {}
        }
    }
}

/// Re-parse a changed file and swap its registry. On failure the previous
/// version stays registered.
fn reload(path: &Path, documents: &DocumentMap, max_depth: usize) {
    let doc = match read_document(path, max_depth) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to reload document, keeping previous version"
            );
            return;
        }
    };

    if !doc.metadata.enabled {
        info!(document_id = %doc.id(), path = %path.display(), "document disabled, unregistering");
        documents
            .write()
            .expect("documents lock poisoned")
            .remove(doc.id());
        return;
    }

    match build_registry(doc, max_depth) {
        Ok(registry) => {
            let registry = insert_registry(documents, registry, Some(path.to_path_buf()));
            info!(
                document_id = %registry.metadata().id,
                models = registry.len(),
                path = %path.display(),
                "hot-reloaded document"
            );
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to rebuild registry, keeping previous version"
            );
        }
    }
}

/// Unregister whichever document was loaded from `path`.
fn remove_by_path(documents: &DocumentMap, path: &Path) {
    let mut guard = documents.write().expect("documents lock poisoned");
    let id = guard
        .iter()
        .find(|(_, doc)| doc.path.as_deref() == Some(path))
        .map(|(id, _)| id.clone());
    if let Some(id) = id {
        guard.remove(&id);
        info!(document_id = %id, path = %path.display(), "removed document after file deletion");
    }
}
