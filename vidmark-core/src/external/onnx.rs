// ============================================================================
// vidmark-core/src/external/onnx.rs
// ============================================================================
//
// ONNX BACKEND: YOLO Detection Models on ONNX Runtime
//
// Loads a YOLOv8-style detection model exported to ONNX and runs it on
// decoded frames. The model takes a square `1x3xSxS` RGB tensor in [0, 1]
// and produces a `[1, 4 + classes, anchors]` tensor of center-format boxes
// followed by per-class scores.
//
// INFERENCE STEPS:
// 1. Resize the RGB frame to the model input size
// 2. Convert to a CHW float tensor
// 3. Run the session and read the single output tensor
// 4. Keep the best class per anchor above the confidence threshold
// 5. Scale boxes back to frame pixels and apply per-class NMS

// ---- Internal crate imports ----
use super::{DetectionModel, ModelLoader};
use crate::config::DetectorConfig;
use crate::detection::{Frame, InferenceOutput};
use crate::error::{CoreError, CoreResult, model_load_error};

// ---- External crate imports ----
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

// ---- Standard library imports ----
use std::fs;
use std::path::Path;

/// Square input edge length of exported YOLO detection models.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// IoU above which overlapping boxes of the same class are suppressed.
const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Loads `.onnx` detection models.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxModelLoader;

impl ModelLoader for OnnxModelLoader {
    fn load(&self, config: &DetectorConfig) -> CoreResult<Box<dyn DetectionModel>> {
        let model = OnnxYoloModel::load(config)?;
        Ok(Box::new(model))
    }
}

/// A YOLO detection model running in an ONNX Runtime session.
pub struct OnnxYoloModel {
    session: Session,
    input_size: u32,
    labels: Vec<String>,
}

impl OnnxYoloModel {
    /// Loads the model at `config.model_reference` and its optional label file.
    pub fn load(config: &DetectorConfig) -> CoreResult<Self> {
        let model_path = Path::new(&config.model_reference);
        log::info!(
            "Loading detector '{}' from {}",
            config.name,
            model_path.display()
        );
        if let Some(device) = &config.device_hint {
            log::debug!(
                "Device hint '{}' for detector '{}'; ONNX Runtime selects execution providers itself",
                device,
                config.name
            );
        }

        let session = Session::builder()
            .map_err(|e| model_load_error(&config.model_reference, e))?
            .commit_from_file(model_path)
            .map_err(|e| model_load_error(&config.model_reference, e))?;

        let input_size = DEFAULT_INPUT_SIZE;

        let labels = match &config.labels_path {
            Some(path) => load_labels(path)
                .map_err(|e| model_load_error(&config.model_reference, e))?,
            None => Vec::new(),
        };

        log::debug!(
            "Detector '{}' ready: input {}x{}, {} label(s)",
            config.name,
            input_size,
            input_size,
            labels.len()
        );

        Ok(Self {
            session,
            input_size,
            labels,
        })
    }

    fn preprocess(&self, frame: &Frame) -> CoreResult<Array4<f32>> {
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                CoreError::Inference(format!(
                    "Frame {} has {} bytes, expected {}x{} RGB",
                    frame.index,
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            })?;

        let size = self.input_size;
        let resized = imageops::resize(&image, size, size, FilterType::Triangle);

        let edge = size as usize;
        let mut input = Array4::<f32>::zeros((1, 3, edge, edge));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
            input[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
            input[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
        }
        Ok(input)
    }
}

impl DetectionModel for OnnxYoloModel {
    fn infer(&mut self, frame: &Frame, confidence_threshold: f32) -> CoreResult<InferenceOutput> {
        let input = self.preprocess(frame)?;
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| CoreError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| CoreError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| CoreError::Inference(format!("Failed to extract tensor: {e}")))?;

        let dims: &[i64] = shape.as_ref();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(CoreError::Inference(format!(
                "Unexpected output shape {dims:?}"
            )));
        }
        let num_features = dims[1] as usize;
        let num_anchors = dims[2] as usize;
        let scale_x = frame.width as f32 / self.input_size as f32;
        let scale_y = frame.height as f32 / self.input_size as f32;

        let candidates = decode_predictions(data, num_features, num_anchors, confidence_threshold)
            .into_iter()
            .map(|c| Candidate {
                corners: [
                    c.corners[0] * scale_x,
                    c.corners[1] * scale_y,
                    c.corners[2] * scale_x,
                    c.corners[3] * scale_y,
                ],
                ..c
            })
            .collect();
        let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

        let mut output = InferenceOutput::empty();
        let mut confidences = Vec::with_capacity(kept.len());
        let mut class_ids = Vec::with_capacity(kept.len());
        for candidate in kept {
            output.boxes.push(candidate.corners.to_vec());
            confidences.push(candidate.confidence);
            class_ids.push(candidate.class_id);
        }
        output.confidences = Some(confidences);
        output.class_ids = Some(class_ids);
        Ok(output)
    }

    fn class_name(&self, class_id: u32) -> Option<String> {
        self.labels.get(class_id as usize).cloned()
    }
}

/// Reads a newline-separated label table, skipping blank lines.
fn load_labels(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    /// `[x1, y1, x2, y2]`
    corners: [f32; 4],
    confidence: f32,
    class_id: u32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.corners[2] - self.corners[0]).max(0.0) * (self.corners[3] - self.corners[1]).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let x1 = self.corners[0].max(other.corners[0]);
        let y1 = self.corners[1].max(other.corners[1]);
        let x2 = self.corners[2].min(other.corners[2]);
        let y2 = self.corners[3].min(other.corners[3]);
        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

/// Reads a `[features, anchors]` block laid out feature-major and keeps the
/// best class of every anchor scoring at least `threshold`.
fn decode_predictions(
    data: &[f32],
    num_features: usize,
    num_anchors: usize,
    threshold: f32,
) -> Vec<Candidate> {
    if data.len() < num_features * num_anchors {
        return Vec::new();
    }
    let feature = |f: usize, anchor: usize| data[f * num_anchors + anchor];

    (0..num_anchors)
        .filter_map(|anchor| {
            let (class_id, confidence) = (4..num_features)
                .map(|f| (f - 4, feature(f, anchor)))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if confidence < threshold {
                return None;
            }

            let (cx, cy) = (feature(0, anchor), feature(1, anchor));
            let (w, h) = (feature(2, anchor), feature(3, anchor));
            Some(Candidate {
                corners: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
                confidence,
                class_id: class_id as u32,
            })
        })
        .collect()
}

/// Greedy per-class non-maximum suppression, highest confidence first.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(corners: [f32; 4], confidence: f32, class_id: u32) -> Candidate {
        Candidate {
            corners,
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_decode_predictions_feature_major_layout() {
        // 2 anchors, 4 box features + 2 classes
        let data = vec![
            50.0, 10.0, // cx
            50.0, 10.0, // cy
            20.0, 4.0, // w
            10.0, 4.0, // h
            0.9, 0.1, // class 0
            0.2, 0.3, // class 1
        ];
        let decoded = decode_predictions(&data, 6, 2, 0.25);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].corners, [40.0, 45.0, 60.0, 55.0]);
        assert_eq!(decoded[0].class_id, 0);
        assert_eq!(decoded[1].class_id, 1);
        assert!((decoded[1].confidence - 0.3).abs() < f32::EPSILON);

        assert_eq!(decode_predictions(&data, 6, 2, 0.5).len(), 1);
    }

    #[test]
    fn test_nms_suppresses_same_class_only() {
        let kept = non_max_suppression(
            vec![
                candidate([0.0, 0.0, 10.0, 10.0], 0.6, 0),
                candidate([1.0, 1.0, 11.0, 11.0], 0.9, 0),
                candidate([1.0, 1.0, 11.0, 11.0], 0.5, 1),
                candidate([50.0, 50.0, 60.0, 60.0], 0.4, 0),
            ],
            NMS_IOU_THRESHOLD,
        );
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].confidence, 0.9);
        assert!(kept.iter().any(|c| c.class_id == 1));
    }

    #[test]
    fn test_iou_of_disjoint_boxes_is_zero() {
        let a = candidate([0.0, 0.0, 1.0, 1.0], 1.0, 0);
        let b = candidate([2.0, 2.0, 3.0, 3.0], 1.0, 0);
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
    }
}
