// ============================================================================
// vidmark-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL CAPABILITIES: Frame Decoding and Model Inference
//
// This module defines the seams between the annotation pipeline and the
// outside world: a frame source that decodes a video into RGB frames, and a
// detection model that turns one frame into a columnar set of boxes. The
// pipeline only talks to these traits, so tests drive it with the mocks in
// `mocks` and production uses ffmpeg-sidecar and (optionally) ONNX Runtime.
//
// KEY COMPONENTS:
// - FrameSource / FrameSourceOpener: decoded frame streams
// - DetectionModel / ModelLoader: model binding and inference
// - Dependency checking for the ffmpeg/ffprobe executables
//
// AI-ASSISTANT-INFO: External tool abstractions for decoding and inference

// ---- Internal crate imports ----
use crate::config::DetectorConfig;
use crate::detection::{Frame, InferenceOutput, VideoMetadata};
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Frame decoding through ffmpeg-sidecar and metadata probing through ffprobe
pub mod ffmpeg_source;

/// Test doubles for frame sources and detection models
pub mod mocks;

/// YOLO models running on ONNX Runtime
#[cfg(feature = "onnx")]
pub mod onnx;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_source::{SidecarFrameSource, SidecarSourceOpener, probe_video_metadata};

#[cfg(feature = "onnx")]
pub use onnx::{OnnxModelLoader, OnnxYoloModel};

// ============================================================================
// TRAITS
// ============================================================================

/// A stream of decoded frames from one video.
pub trait FrameSource {
    /// Properties reported when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Returns the next frame, or `None` once the stream is exhausted.
    ///
    /// An `Err` means the source cannot produce any more frames; callers
    /// treat it as the end of the stream.
    fn next_frame(&mut self) -> CoreResult<Option<Frame>>;
}

/// Something that can open a video path as a `FrameSource`.
pub trait FrameSourceOpener {
    type Source: FrameSource;

    fn open(&self, path: &Path) -> CoreResult<Self::Source>;
}

/// A loaded detection model.
pub trait DetectionModel {
    /// Runs inference on one frame, reporting only boxes at or above
    /// `confidence_threshold`.
    fn infer(&mut self, frame: &Frame, confidence_threshold: f32) -> CoreResult<InferenceOutput>;

    /// Looks up the label for a class id, if the model has one.
    fn class_name(&self, class_id: u32) -> Option<String>;
}

/// Turns a detector configuration into a loaded model.
pub trait ModelLoader {
    fn load(&self, config: &DetectorConfig) -> CoreResult<Box<dyn DetectionModel>>;
}

// ============================================================================
// DEFAULT MODEL LOADER
// ============================================================================

/// The model loader used by the CLI.
///
/// With the `onnx` feature enabled this loads YOLO models exported to ONNX;
/// without it every load fails with a `ModelLoad` error naming the missing
/// backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelLoader;

impl ModelLoader for DefaultModelLoader {
    #[cfg(feature = "onnx")]
    fn load(&self, config: &DetectorConfig) -> CoreResult<Box<dyn DetectionModel>> {
        OnnxModelLoader.load(config)
    }

    #[cfg(not(feature = "onnx"))]
    fn load(&self, config: &DetectorConfig) -> CoreResult<Box<dyn DetectionModel>> {
        Err(crate::error::model_load_error(
            &config.model_reference,
            "this build has no inference backend (rebuild with the `onnx` feature)",
        ))
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `cmd_name -version` and discards its output; only a missing
/// executable is an error.
///
/// # Examples
///
/// ```rust,no_run
/// use vidmark_core::external::check_dependency;
///
/// if check_dependency("ffmpeg").is_err() {
///     eprintln!("ffmpeg is not installed");
/// }
/// ```
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::DependencyNotFound(format!("{cmd_name} ({e})")))
        }
    }
}
