//! Detector binding and per-box normalization.
//!
//! This module holds the leaf components of the annotation pipeline: the
//! frame/detection data types shared with the external capabilities, the
//! `Detector` binding that wraps one model with its policy, and the pure
//! normalizer that turns pixel-space boxes into clamped, frame-relative ones.

pub mod binding;
pub mod normalize;
pub mod types;

pub use binding::Detector;
pub use normalize::{MISSING_CONFIDENCE, NormalizedBox, accepts_class, normalize};
pub use types::{Frame, InferenceOutput, RawDetection, VideoMetadata};
