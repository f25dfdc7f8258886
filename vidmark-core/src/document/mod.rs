// ============================================================================
// vidmark-core/src/document/mod.rs
// ============================================================================
//
// ANNOTATION DOCUMENT: The Persisted Result of Annotating One Video
//
// An `AnnotationDocument` holds the video header, a sparse mapping from
// frame index to the annotations found on that frame, and run statistics.
// Frames are kept in a `BTreeMap` so they serialize in numeric order and a
// frame key exists only when at least one annotation was accepted for it.
//
// The JSON layout is consumed by the annotation UI:
//
// ```json
// {
//   "video_info": { "filename": "clip.mp4", "width": 1920, ... },
//   "annotations": { "0": [ { "id": "face_0_0", "x": 0.1, ..., "type": "ai-generated", "class": "face" } ] },
//   "statistics": { "frames_processed": 1, ... }
// }
// ```

mod store;

pub use store::{load_document, save_document};

// ---- Internal crate imports ----
use crate::config::{DEFAULT_FPS_FALLBACK, PipelineConfig};
use crate::detection::{NormalizedBox, VideoMetadata};

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::collections::BTreeMap;
use std::time::Duration;

/// Source tag written on every annotation produced by a detector.
pub const AI_GENERATED_TAG: &str = "ai-generated";

/// Frame index to the annotations accepted on that frame.
pub type FrameAnnotations = BTreeMap<u64, Vec<Annotation>>;

/// One accepted, normalized box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// `{detector}_{frame}_{seq}`, unique within a document
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
    /// Where the box came from; always `AI_GENERATED_TAG` for detector output
    #[serde(rename = "type")]
    pub source: String,
    /// Logical name of the detector that produced the box
    #[serde(rename = "class")]
    pub label: String,
}

impl Annotation {
    pub fn new(id: impl Into<String>, bbox: &NormalizedBox, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            confidence: bbox.confidence,
            source: AI_GENERATED_TAG.to_string(),
            label: label.into(),
        }
    }
}

/// Per-detector entry of `ProcessingSettings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub name: String,
    pub model: String,
    pub confidence: f32,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// The settings a document was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSettings {
    pub detectors: Vec<DetectorSettings>,
    pub sample_rate: u32,
    #[serde(default)]
    pub min_box_area: Option<f64>,
    #[serde(default)]
    pub max_box_area: Option<f64>,
    #[serde(default)]
    pub aspect_ratio_filter: bool,
}

impl ProcessingSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            detectors: config
                .detectors
                .iter()
                .map(|d| DetectorSettings {
                    name: d.name.clone(),
                    model: d.model_reference.clone(),
                    confidence: d.confidence_threshold,
                    classes: d.accepted_classes.iter().cloned().collect(),
                })
                .collect(),
            sample_rate: config.sample_rate,
            min_box_area: config.box_filter.min_area,
            max_box_area: config.box_filter.max_area,
            aspect_ratio_filter: config.box_filter.aspect_ratio,
        }
    }
}

/// Header describing the annotated video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Whole frames per second
    pub fps: u32,
    /// Frame count reported by the container (advisory)
    pub frame_count: u64,
    /// Seconds, `frame_count / fps`
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_settings: Option<ProcessingSettings>,
}

impl VideoInfo {
    /// Builds the header from source metadata.
    ///
    /// The frame rate is truncated to whole frames; a rate below 1 is
    /// recorded as `DEFAULT_FPS_FALLBACK`.
    pub fn new(filename: impl Into<String>, metadata: &VideoMetadata) -> Self {
        let fps = match metadata.fps {
            f if f.is_finite() && f >= 1.0 => f as u32,
            _ => DEFAULT_FPS_FALLBACK,
        };
        Self {
            filename: filename.into(),
            width: metadata.width,
            height: metadata.height,
            fps,
            frame_count: metadata.frame_count,
            duration: metadata.frame_count as f64 / f64::from(fps),
            processing_settings: None,
        }
    }

    pub fn with_processing_settings(mut self, settings: ProcessingSettings) -> Self {
        self.processing_settings = Some(settings);
        self
    }
}

/// Run statistics. Always consistent with the document's annotations once
/// `AnnotationDocument::finalize` has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Frames with at least one annotation
    pub frames_processed: u64,
    pub frames_with_detections: u64,
    pub total_detections: u64,
    pub average_detections_per_frame: f64,
    /// Wall-clock seconds spent on the video
    pub processing_time: f64,
    /// Frames pulled from the source
    #[serde(default)]
    pub frames_read: u64,
    /// Frames the detectors ran on
    #[serde(default)]
    pub frames_sampled: u64,
    #[serde(default)]
    pub detections_by_detector: BTreeMap<String, u64>,
}

/// Annotations and statistics for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub video_info: VideoInfo,
    pub annotations: FrameAnnotations,
    pub statistics: Statistics,
}

impl AnnotationDocument {
    pub fn new(video_info: VideoInfo) -> Self {
        Self {
            video_info,
            annotations: FrameAnnotations::new(),
            statistics: Statistics::default(),
        }
    }

    /// Stores the annotations of one frame. Empty lists are not stored.
    ///
    /// Returns whether the frame was stored.
    pub fn insert_frame(&mut self, frame_index: u64, annotations: Vec<Annotation>) -> bool {
        if annotations.is_empty() {
            return false;
        }
        self.annotations.insert(frame_index, annotations);
        true
    }

    pub fn frames_with_detections(&self) -> u64 {
        self.annotations.len() as u64
    }

    pub fn total_detections(&self) -> u64 {
        self.annotations.values().map(|a| a.len() as u64).sum()
    }

    /// Recomputes the statistics from the stored annotations.
    ///
    /// Every name in `detector_names` appears in `detections_by_detector`,
    /// with 0 when it produced nothing.
    pub fn finalize<'a>(
        &mut self,
        detector_names: impl IntoIterator<Item = &'a str>,
        frames_read: u64,
        frames_sampled: u64,
        processing_time: Duration,
    ) {
        let mut by_detector: BTreeMap<String, u64> = detector_names
            .into_iter()
            .map(|name| (name.to_string(), 0))
            .collect();
        for annotation in self.annotations.values().flatten() {
            *by_detector.entry(annotation.label.clone()).or_default() += 1;
        }

        let frames = self.frames_with_detections();
        let total = self.total_detections();
        self.statistics = Statistics {
            frames_processed: frames,
            frames_with_detections: frames,
            total_detections: total,
            average_detections_per_frame: if frames > 0 {
                total as f64 / frames as f64
            } else {
                0.0
            },
            processing_time: processing_time.as_secs_f64(),
            frames_read,
            frames_sampled,
            detections_by_detector: by_detector,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(id: &str, label: &str) -> Annotation {
        let bbox = NormalizedBox {
            x: 0.1,
            y: 0.1,
            width: 0.2,
            height: 0.2,
            confidence: 0.9,
        };
        Annotation::new(id, &bbox, label)
    }

    #[test]
    fn test_video_info_fps_fallback() {
        let info = VideoInfo::new("clip.mp4", &VideoMetadata::new(640, 480, 0.0, 90));
        assert_eq!(info.fps, DEFAULT_FPS_FALLBACK);
        assert!((info.duration - 3.0).abs() < 1e-9);

        let info = VideoInfo::new("clip.mp4", &VideoMetadata::new(640, 480, 29.97, 299));
        assert_eq!(info.fps, 29);
        assert!((info.duration - 299.0 / 29.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_frame_ignores_empty() {
        let mut doc = AnnotationDocument::new(VideoInfo::new("a.mp4", &VideoMetadata::default()));
        assert!(!doc.insert_frame(0, Vec::new()));
        assert!(doc.insert_frame(4, vec![annotation("face_4_0", "face")]));
        assert_eq!(doc.annotations.keys().copied().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_finalize_statistics() {
        let mut doc = AnnotationDocument::new(VideoInfo::new("a.mp4", &VideoMetadata::default()));
        doc.insert_frame(
            0,
            vec![annotation("face_0_0", "face"), annotation("plate_0_1", "plate")],
        );
        doc.insert_frame(7, vec![annotation("face_7_0", "face")]);

        doc.finalize(["face", "plate", "logo"], 10, 10, Duration::from_millis(1500));

        let stats = &doc.statistics;
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.frames_with_detections, 2);
        assert_eq!(stats.total_detections, 3);
        assert!((stats.average_detections_per_frame - 1.5).abs() < 1e-9);
        assert!((stats.processing_time - 1.5).abs() < 1e-9);
        assert_eq!(stats.detections_by_detector["face"], 2);
        assert_eq!(stats.detections_by_detector["plate"], 1);
        assert_eq!(stats.detections_by_detector["logo"], 0);
    }

    #[test]
    fn test_finalize_empty_document() {
        let mut doc = AnnotationDocument::new(VideoInfo::new("a.mp4", &VideoMetadata::default()));
        doc.finalize(["face"], 0, 0, Duration::ZERO);
        assert_eq!(doc.statistics.total_detections, 0);
        assert_eq!(doc.statistics.average_detections_per_frame, 0.0);
    }

    #[test]
    fn test_annotation_json_field_names() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(annotation("face_0_0", "face"))?;
        assert_eq!(value["type"], AI_GENERATED_TAG);
        assert_eq!(value["class"], "face");
        assert!(value.get("source").is_none());
        Ok(())
    }
}
