// ============================================================================
// vidmark-core/src/detection/types.rs
// ============================================================================
//
// DETECTION TYPES: Frames, Source Metadata and Raw Detector Output
//
// These are the shapes exchanged with the external collaborators: a frame
// source produces `Frame`s described by `VideoMetadata`, a detection model
// returns an `InferenceOutput` per frame, and the detector binding turns
// that into a fixed list of `RawDetection`s before anything else sees it.

/// Properties reported by a frame source when it is opened.
///
/// `frame_count` is advisory: some containers report 0 or an estimate, so
/// it is only ever used for progress display and the document header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Frames per second, 0.0 when the container does not say
    pub fps: f64,
    pub frame_count: u64,
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_count,
        }
    }
}

/// One decoded frame as packed RGB24 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position of the frame in the decoded stream, as reported by the source
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Row-major RGB24 pixel data (`width * height * 3` bytes)
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            width,
            height,
            data,
        }
    }

    /// A black frame of the given size.
    pub fn blank(index: u64, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self::new(index, width, height, vec![0; len])
    }
}

/// Columnar result of one inference call, as a detection capability hands
/// it back.
///
/// The columns are not guaranteed to be consistent: `boxes` rows may be
/// short, and `confidences` / `class_ids` may be missing entirely or be
/// shorter than `boxes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceOutput {
    /// Pixel-space `[x1, y1, x2, y2, ...]` rows
    pub boxes: Vec<Vec<f32>>,
    pub confidences: Option<Vec<f32>>,
    pub class_ids: Option<Vec<u32>>,
}

impl InferenceOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a fully populated output from `(x1, y1, x2, y2, confidence, class_id)` tuples.
    pub fn from_boxes(boxes: &[(f32, f32, f32, f32, f32, u32)]) -> Self {
        Self {
            boxes: boxes
                .iter()
                .map(|&(x1, y1, x2, y2, _, _)| vec![x1, y1, x2, y2])
                .collect(),
            confidences: Some(boxes.iter().map(|b| b.4).collect()),
            class_ids: Some(boxes.iter().map(|b| b.5).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// One box from one detector on one frame, in the fixed shape the rest of
/// the pipeline works with.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: Option<f32>,
    pub class_id: Option<u32>,
    pub class_name: Option<String>,
}

impl RawDetection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence: None,
            class_id: None,
            class_name: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_class(mut self, class_id: u32, class_name: impl Into<String>) -> Self {
        self.class_id = Some(class_id);
        self.class_name = Some(class_name.into());
        self
    }
}
