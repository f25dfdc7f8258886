// ============================================================================
// vidmark-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for PipelineConfig
//
// This module implements the builder pattern for the PipelineConfig
// structure, providing a fluent API for assembling the detector list and
// the run-wide sampling and filtering options.

// ---- Internal crate imports ----
use super::{BoxFilter, DetectorConfig, PipelineConfig};

/// Builder for creating PipelineConfig instances.
///
/// # Examples
///
/// ```rust
/// use vidmark_core::config::{DetectorConfig, PipelineConfigBuilder};
///
/// let config = PipelineConfigBuilder::new()
///     .detector(DetectorConfig::new("face", "models/face.onnx"))
///     .min_box_area(0.01)
///     .aspect_ratio_filter(true)
///     .show_progress(false)
///     .build();
///
/// assert_eq!(config.detectors.len(), 1);
/// assert!(config.box_filter.aspect_ratio);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a builder holding the default configuration and no detectors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a detector; detectors run in the order they are added.
    pub fn detector(mut self, detector: DetectorConfig) -> Self {
        self.config.detectors.push(detector);
        self
    }

    /// Replaces the detector list.
    pub fn detectors(mut self, detectors: Vec<DetectorConfig>) -> Self {
        self.config.detectors = detectors;
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn min_box_area(mut self, area: f64) -> Self {
        self.config.box_filter.min_area = Some(area);
        self
    }

    pub fn max_box_area(mut self, area: f64) -> Self {
        self.config.box_filter.max_area = Some(area);
        self
    }

    pub fn aspect_ratio_filter(mut self, enabled: bool) -> Self {
        self.config.box_filter.aspect_ratio = enabled;
        self
    }

    pub fn box_filter(mut self, filter: BoxFilter) -> Self {
        self.config.box_filter = filter;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Returns the configuration. Call `PipelineConfig::validate` (or let
    /// `AnnotationPipeline::new` do it) before use.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
