//! Configuration structures and constants for the vidmark-core library.
//!
//! This module provides the per-detector policy (`DetectorConfig`), the
//! post-normalization box filters (`BoxFilter`) and the run-wide
//! `PipelineConfig` that bundles them.

mod builder;
mod file;

use crate::detection::NormalizedBox;
use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

pub use builder::PipelineConfigBuilder;
pub use file::{load_detector_configs, save_detector_configs};

// Default constants

/// Default minimum confidence a detector reports boxes at.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Default frame sampling rate (run detectors on every frame).
pub const DEFAULT_SAMPLE_RATE: u32 = 1;

/// Frame rate written to the document when the container reports none.
pub const DEFAULT_FPS_FALLBACK: u32 = 30;

/// Progress is reported every this many sampled frames.
pub const PROGRESS_INTERVAL_FRAMES: u64 = 30;

/// Inclusive width/height ratio range kept by the aspect-ratio filter.
pub const ASPECT_RATIO_RANGE: (f64, f64) = (0.5, 2.0);

/// Default detector names used by the CLI.
pub const FACE_DETECTOR_NAME: &str = "face";
pub const LICENSE_PLATE_DETECTOR_NAME: &str = "license_plate";

/// Identity and policy for one model binding.
///
/// Field names in JSON follow the short form used in detector files:
///
/// ```json
/// { "name": "face", "model": "models/face.onnx", "confidence": 0.3, "classes": ["face"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Logical name; tags every annotation this detector produces
    pub name: String,

    /// Opaque locator handed to the model loader
    #[serde(rename = "model")]
    pub model_reference: String,

    /// Minimum confidence passed to the model (0.0-1.0)
    #[serde(rename = "confidence", default = "default_confidence")]
    pub confidence_threshold: f32,

    /// Class names to keep; empty accepts every class
    #[serde(rename = "classes", default)]
    pub accepted_classes: BTreeSet<String>,

    /// Device hint forwarded to the model loader (e.g. "cpu", "0")
    #[serde(rename = "device", default, skip_serializing_if = "Option::is_none")]
    pub device_hint: Option<String>,

    /// Newline-separated label table for models that do not embed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_path: Option<PathBuf>,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl DetectorConfig {
    pub fn new(name: impl Into<String>, model_reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_reference: model_reference.into(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            accepted_classes: BTreeSet::new(),
            device_hint: None,
            labels_path: None,
        }
    }

    pub fn with_confidence(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_hint = Some(device.into());
        self
    }

    pub fn with_labels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    /// Checks the name, model reference and threshold.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Config("Detector name must not be empty".to_string()));
        }
        if self.model_reference.trim().is_empty() {
            return Err(CoreError::Config(format!(
                "Detector '{}' has an empty model reference",
                self.name
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::Config(format!(
                "Detector '{}' confidence threshold {} is outside 0.0-1.0",
                self.name, self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Filters applied to normalized boxes before they are accepted into a frame.
///
/// Areas are fractions of the frame area (`width * height` of the
/// normalized box). The default filter keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxFilter {
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    /// Keep only boxes whose width/height ratio is within `ASPECT_RATIO_RANGE`
    pub aspect_ratio: bool,
}

impl BoxFilter {
    pub fn is_active(&self) -> bool {
        self.min_area.is_some() || self.max_area.is_some() || self.aspect_ratio
    }

    pub fn accepts(&self, bbox: &NormalizedBox) -> bool {
        let area = bbox.area();
        if self.min_area.is_some_and(|min| area < min) {
            return false;
        }
        if self.max_area.is_some_and(|max| area > max) {
            return false;
        }
        if self.aspect_ratio {
            let (low, high) = ASPECT_RATIO_RANGE;
            match bbox.aspect_ratio() {
                Some(ratio) if (low..=high).contains(&ratio) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (label, value) in [("minimum", self.min_area), ("maximum", self.max_area)] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(CoreError::Config(format!(
                        "Box {label} area {v} is outside 0.0-1.0"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_area, self.max_area) {
            if min > max {
                return Err(CoreError::Config(format!(
                    "Minimum box area {min} exceeds maximum box area {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Run-wide configuration for an `AnnotationPipeline`.
///
/// # Examples
///
/// ```rust
/// use vidmark_core::config::{DetectorConfig, PipelineConfigBuilder};
///
/// let config = PipelineConfigBuilder::new()
///     .detector(DetectorConfig::new("face", "models/face.onnx").with_classes(["face"]))
///     .detector(DetectorConfig::new("license_plate", "models/plate.onnx"))
///     .sample_rate(2)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Detectors in the order they run on every frame
    pub detectors: Vec<DetectorConfig>,

    /// Run detectors on every Nth frame only (1 = every frame)
    pub sample_rate: u32,

    /// Size/shape filters applied after normalization
    pub box_filter: BoxFilter,

    /// Draw a progress bar when stderr is a terminal
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detectors: Vec::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            box_filter: BoxFilter::default(),
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    pub fn new(detectors: Vec<DetectorConfig>) -> Self {
        Self {
            detectors,
            ..Self::default()
        }
    }

    /// Validates the configuration as a whole.
    ///
    /// At least one detector is required and detector names must be unique,
    /// since names prefix every annotation id.
    pub fn validate(&self) -> CoreResult<()> {
        if self.detectors.is_empty() {
            return Err(CoreError::Config(
                "At least one detector must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for detector in &self.detectors {
            detector.validate()?;
            if !seen.insert(detector.name.as_str()) {
                return Err(CoreError::Config(format!(
                    "Duplicate detector name '{}'",
                    detector.name
                )));
            }
        }

        if self.sample_rate == 0 {
            return Err(CoreError::Config("Sample rate must be at least 1".to_string()));
        }

        self.box_filter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(width: f64, height: f64) -> NormalizedBox {
        NormalizedBox {
            x: 0.0,
            y: 0.0,
            width,
            height,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_detector_config_validation() {
        assert!(DetectorConfig::new("face", "face.onnx").validate().is_ok());
        assert!(DetectorConfig::new("", "face.onnx").validate().is_err());
        assert!(DetectorConfig::new("face", " ").validate().is_err());
        assert!(
            DetectorConfig::new("face", "face.onnx")
                .with_confidence(1.5)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_pipeline_config_rejects_duplicate_names() {
        let config = PipelineConfig::new(vec![
            DetectorConfig::new("face", "a.onnx"),
            DetectorConfig::new("face", "b.onnx"),
        ]);
        match config.validate() {
            Err(CoreError::Config(msg)) => assert!(msg.contains("Duplicate")),
            other => panic!("Expected duplicate name error, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_config_requires_detectors_and_sample_rate() {
        assert!(PipelineConfig::default().validate().is_err());

        let mut config = PipelineConfig::new(vec![DetectorConfig::new("face", "a.onnx")]);
        config.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_box_filter_area_bounds() {
        let filter = BoxFilter {
            min_area: Some(0.01),
            max_area: Some(0.5),
            aspect_ratio: false,
        };
        assert!(filter.accepts(&bbox(0.2, 0.2)));
        assert!(!filter.accepts(&bbox(0.05, 0.05)));
        assert!(!filter.accepts(&bbox(0.9, 0.9)));
    }

    #[test]
    fn test_box_filter_aspect_ratio() {
        let filter = BoxFilter {
            aspect_ratio: true,
            ..BoxFilter::default()
        };
        assert!(filter.accepts(&bbox(0.2, 0.2)));
        assert!(filter.accepts(&bbox(0.2, 0.1)));
        assert!(!filter.accepts(&bbox(0.3, 0.1)));
        assert!(!filter.accepts(&bbox(0.2, 0.0)));
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let filter = BoxFilter::default();
        assert!(!filter.is_active());
        assert!(filter.accepts(&bbox(0.0, 0.0)));
    }

    #[test]
    fn test_box_filter_validation() {
        let inverted = BoxFilter {
            min_area: Some(0.5),
            max_area: Some(0.1),
            aspect_ratio: false,
        };
        assert!(inverted.validate().is_err());
    }
}
