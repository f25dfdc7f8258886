// ============================================================================
// vidmark-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Annotation Pipeline
//
// This module defines the error taxonomy used across vidmark-core. Fatal
// errors (missing/unreadable sources, detector bind failures, invalid
// configuration) propagate to the caller; per-frame and per-detection
// problems are logged where they happen and never become a `CoreError`
// past the frame aggregator.

use thiserror::Error;

/// Errors produced by the annotation pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Video file not found: {0}")]
    SourceNotFound(String),

    #[error("Cannot open video file {path}: {reason}")]
    SourceOpen { path: String, reason: String },

    #[error("Frame decoding failed: {0}")]
    Decode(String),

    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Failed to save annotations to {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No processable video files found")]
    NoFilesFound,

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for vidmark-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CoreError::ModelLoad` for the given model reference.
pub fn model_load_error(model: &str, reason: impl std::fmt::Display) -> CoreError {
    CoreError::ModelLoad {
        model: model.to_string(),
        reason: reason.to_string(),
    }
}

/// Builds a `CoreError::SourceOpen` for the given video path.
pub fn source_open_error(path: &std::path::Path, reason: impl std::fmt::Display) -> CoreError {
    CoreError::SourceOpen {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Builds a `CoreError::Persistence` for the given destination.
pub fn persistence_error(path: &std::path::Path, reason: impl std::fmt::Display) -> CoreError {
    CoreError::Persistence {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
