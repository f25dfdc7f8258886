//! Reading and writing annotation documents as JSON files.

use super::AnnotationDocument;
use crate::error::{CoreResult, persistence_error};

use std::fs;
use std::path::Path;

/// Writes `document` to `destination` as pretty-printed JSON.
///
/// Missing parent directories are created. Any failure is reported as
/// `CoreError::Persistence`.
pub fn save_document(document: &AnnotationDocument, destination: &Path) -> CoreResult<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence_error(destination, e))?;
    }

    let json =
        serde_json::to_string_pretty(document).map_err(|e| persistence_error(destination, e))?;
    fs::write(destination, json).map_err(|e| persistence_error(destination, e))?;

    log::debug!(
        "Saved {} annotation(s) across {} frame(s) to {}",
        document.total_detections(),
        document.frames_with_detections(),
        destination.display()
    );
    Ok(())
}

/// Reads a document written by `save_document`.
///
/// Frame keys must be non-negative integers; they come back in numeric
/// order.
pub fn load_document(path: &Path) -> CoreResult<AnnotationDocument> {
    let contents = fs::read_to_string(path).map_err(|e| persistence_error(path, e))?;
    serde_json::from_str(&contents).map_err(|e| persistence_error(path, e))
}
