//! Core library for annotating videos with one or more object detectors.
//!
//! This crate drives a frame source (ffmpeg by default), runs every configured
//! detector on each sampled frame, normalizes and filters the boxes, and
//! collects them into a sparse, frame-indexed annotation document that is
//! saved as JSON for the annotation UI.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidmark_core::config::{DetectorConfig, PipelineConfigBuilder};
//! use vidmark_core::external::{DefaultModelLoader, SidecarSourceOpener};
//! use vidmark_core::{AnnotationPipeline, find_processable_files, process_videos};
//! use std::path::Path;
//!
//! let config = PipelineConfigBuilder::new()
//!     .detector(DetectorConfig::new("face", "models/yolo11n-face.onnx").with_confidence(0.3))
//!     .detector(DetectorConfig::new("license_plate", "models/license-plate-finetune-v1l.onnx"))
//!     .build();
//!
//! let mut pipeline =
//!     AnnotationPipeline::new(config, SidecarSourceOpener, &DefaultModelLoader).unwrap();
//!
//! let files = find_processable_files(Path::new("videos")).unwrap();
//! let report = process_videos(&mut pipeline, &files, Path::new("assets-json"));
//! println!("{} of {} videos annotated", report.succeeded.len(), report.total());
//! ```

pub mod config;
pub mod detection;
pub mod discovery;
pub mod document;
pub mod error;
pub mod external;
pub mod processing;
pub mod terminal;
pub mod utils;

// Re-exports for public API
pub use config::{BoxFilter, DetectorConfig, PipelineConfig, PipelineConfigBuilder};
pub use detection::{Detector, NormalizedBox, RawDetection};
pub use discovery::find_processable_files;
pub use document::{AnnotationDocument, Annotation, Statistics, VideoInfo, load_document, save_document};
pub use error::{CoreError, CoreResult};
pub use processing::{AnnotationPipeline, BatchOutcome, BatchReport, FrameAggregator, process_videos};
pub use utils::format_duration;
