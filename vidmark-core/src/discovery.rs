//! File discovery module for finding video files to process.
//!
//! This module handles the discovery of video files eligible for annotation.
//! It searches the top level of the provided directory for common video
//! container extensions (case-insensitive).

use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Extensions (lowercase, without the dot) treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "m4v"];

/// Returns true if `path` has one of the `VIDEO_EXTENSIONS`.
#[must_use]
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Finds video files eligible for processing in the specified directory.
///
/// This function scans the top level of the provided directory for video
/// files and returns their paths sorted by name. It does not search
/// subdirectories.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - The discovered video files
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no video files are found
///
/// # Examples
///
/// ```rust,no_run
/// use vidmark_core::find_processable_files;
/// use std::path::Path;
///
/// match find_processable_files(Path::new("videos")) {
///     Ok(files) => {
///         for file in files {
///             println!("  {}", file.display());
///         }
///     }
///     Err(e) => println!("Error finding video files: {}", e),
/// }
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file() && has_video_extension(&path)).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }

    files.sort();
    log::debug!(
        "Found {} video file(s) in {}",
        files.len(),
        input_dir.display()
    );
    Ok(files)
}
