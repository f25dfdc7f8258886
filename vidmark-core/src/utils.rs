//! Utility functions for formatting and path handling.
//!
//! This module provides general-purpose utility functions used throughout the
//! vidmark-core library: duration formatting for logs and summaries, and the
//! naming rules for annotation output files.

use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Suffix appended to a video's stem to name its annotation document.
pub const ANNOTATION_FILE_SUFFIX: &str = "_annotations.json";

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Safely extracts filename from a path with consistent error handling.
/// Returns the filename as a String, or an error if the path has no filename component.
pub fn get_filename_safe(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            CoreError::PathError(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Returns `output_dir/{stem}_annotations.json` for `video`.
pub fn annotation_output_path(video: &Path, output_dir: &Path) -> CoreResult<PathBuf> {
    let stem = video.file_stem().ok_or_else(|| {
        CoreError::PathError(format!("Failed to get filename stem for {}", video.display()))
    })?;
    Ok(output_dir.join(format!(
        "{}{}",
        stem.to_string_lossy(),
        ANNOTATION_FILE_SUFFIX
    )))
}
