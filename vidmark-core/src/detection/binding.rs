// ============================================================================
// vidmark-core/src/detection/binding.rs
// ============================================================================
//
// DETECTOR BINDING: One Model Handle Plus Its Policy
//
// A `Detector` pairs a `DetectorConfig` with the model the loader produced
// for it. The model is acquired once at bind time. Per frame, the binding
// runs inference and converts the model's columnar output into a fixed
// list of `RawDetection`s, dropping rows it cannot interpret. Inference
// failures are logged and reported as "no detections" so that one bad
// frame never stops a video.

// ---- Internal crate imports ----
use crate::config::DetectorConfig;
use crate::detection::types::{Frame, InferenceOutput, RawDetection};
use crate::error::{CoreResult, model_load_error};
use crate::external::{DetectionModel, ModelLoader};

// ---- Standard library imports ----
use std::fmt;
use std::path::Path;

/// File extensions that mark a model reference as a local model file.
const LOCAL_MODEL_EXTENSIONS: &[&str] = &["pt", "onnx", "engine", "torchscript"];

/// A bound detector: configuration plus loaded model.
pub struct Detector {
    config: DetectorConfig,
    model: Box<dyn DetectionModel>,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Detector {
    /// Validates `config` and acquires its model through `loader`.
    ///
    /// References that name a local model file (`.pt`, `.onnx`, `.engine`,
    /// `.torchscript`) must exist; anything else is passed to the loader
    /// untouched.
    pub fn bind<L: ModelLoader + ?Sized>(config: DetectorConfig, loader: &L) -> CoreResult<Self> {
        config.validate()?;

        let reference = Path::new(&config.model_reference);
        if is_local_model_file(reference) && !reference.exists() {
            log::error!(
                "Model file for detector '{}' not found: {}",
                config.name,
                reference.display()
            );
            return Err(model_load_error(&config.model_reference, "Model file not found"));
        }

        let model = loader.load(&config)?;
        log::info!(
            "Bound detector '{}' to {} (confidence >= {})",
            config.name,
            config.model_reference,
            config.confidence_threshold
        );
        Ok(Self { config, model })
    }

    /// Wraps an already loaded model.
    pub fn from_model(config: DetectorConfig, model: Box<dyn DetectionModel>) -> Self {
        Self { config, model }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Runs the model on `frame` and returns its detections.
    ///
    /// Never fails: an inference error is logged and yields no detections.
    pub fn detect(&mut self, frame: &Frame) -> Vec<RawDetection> {
        match self.model.infer(frame, self.config.confidence_threshold) {
            Ok(output) => self.convert(output, frame.index),
            Err(e) => {
                log::warn!(
                    "Detector '{}' failed on frame {}: {}",
                    self.config.name,
                    frame.index,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Converts a columnar inference result into raw detections.
    fn convert(&self, output: InferenceOutput, frame_index: u64) -> Vec<RawDetection> {
        let InferenceOutput {
            boxes,
            confidences,
            class_ids,
        } = output;

        let mut detections = Vec::with_capacity(boxes.len());
        for (i, row) in boxes.iter().enumerate() {
            let [x1, y1, x2, y2] = match row.get(..4) {
                Some(&[x1, y1, x2, y2]) => [x1, y1, x2, y2],
                _ => {
                    log::warn!(
                        "Detector '{}' frame {}: skipping box {} with {} coordinate(s)",
                        self.config.name,
                        frame_index,
                        i,
                        row.len()
                    );
                    continue;
                }
            };
            if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
                log::warn!(
                    "Detector '{}' frame {}: skipping box {} with non-finite coordinates",
                    self.config.name,
                    frame_index,
                    i
                );
                continue;
            }

            let mut detection = RawDetection::new(x1, y1, x2, y2);
            detection.confidence = confidences.as_ref().and_then(|c| c.get(i)).copied();
            if let Some(class_id) = class_ids.as_ref().and_then(|c| c.get(i)).copied() {
                let class_name = self
                    .model
                    .class_name(class_id)
                    .unwrap_or_else(|| format!("class_{class_id}"));
                detection = detection.with_class(class_id, class_name);
            }
            detections.push(detection);
        }
        detections
    }
}

fn is_local_model_file(reference: &Path) -> bool {
    reference
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            LOCAL_MODEL_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
