//! Annotation orchestration: per-frame aggregation, the per-video driver and
//! batch processing.
//!
//! This module serves as the central hub for running detectors over videos.
//! `FrameAggregator` handles a single frame, `AnnotationPipeline` a single
//! video and `process_videos` a list of videos.

/// Per-frame merging of detector results
pub mod aggregate;

/// Per-video driver
pub mod pipeline;

/// Multi-video batch driver
pub mod batch;

pub use aggregate::FrameAggregator;
pub use batch::{BatchOutcome, BatchReport, VideoFailure, VideoResult, process_videos};
pub use pipeline::AnnotationPipeline;
