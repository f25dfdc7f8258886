// ============================================================================
// vidmark-core/src/external/mocks.rs
// ============================================================================
//
// MOCKING INFRASTRUCTURE: In-Memory Frame Sources and Detection Models
//
// Test doubles for the external capabilities. Videos are registered by path
// with a frame count (or as corrupt), and detection models answer per frame
// index with canned outputs or failures. Every mock records the calls it
// receives behind `Rc<RefCell<..>>` handles so tests can inspect them after
// the mock has been moved into a pipeline.

// ---- Internal crate imports ----
use super::{DetectionModel, FrameSource, FrameSourceOpener, ModelLoader};
use crate::config::DetectorConfig;
use crate::detection::{Frame, InferenceOutput, VideoMetadata};
use crate::error::{CoreError, CoreResult, model_load_error, source_open_error};

// ---- Standard library imports ----
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ============================================================================
// FRAME SOURCES
// ============================================================================

/// A frame source serving pre-built frames from memory.
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    metadata: VideoMetadata,
    frames: VecDeque<Frame>,
    /// Returned once the frames run out, instead of end-of-stream
    trailing_error: Option<String>,
}

impl MockFrameSource {
    /// A source yielding `frame_count` blank frames of the metadata's size.
    ///
    /// `metadata.frame_count` is left as given, so tests can make the
    /// advisory count disagree with the real one.
    pub fn blank(metadata: VideoMetadata, frame_count: u64) -> Self {
        let frames = (0..frame_count)
            .map(|i| Frame::blank(i, metadata.width, metadata.height))
            .collect();
        Self {
            metadata,
            frames,
            trailing_error: None,
        }
    }

    /// Fails with a decode error after the remaining frames are served.
    pub fn with_trailing_error(mut self, reason: impl Into<String>) -> Self {
        self.trailing_error = Some(reason.into());
        self
    }
}

impl FrameSource for MockFrameSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> CoreResult<Option<Frame>> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None => match self.trailing_error.take() {
                Some(reason) => Err(CoreError::Decode(reason)),
                None => Ok(None),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum MockVideo {
    Playable(MockFrameSource),
    Corrupt(String),
}

/// Opens registered paths as `MockFrameSource`s.
///
/// Unregistered paths fail to open, like an unreadable file would.
#[derive(Debug, Clone, Default)]
pub struct MockSourceOpener {
    videos: Rc<RefCell<HashMap<PathBuf, MockVideo>>>,
    opened: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockSourceOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a video of `metadata.frame_count` blank frames.
    pub fn add_video(&self, path: impl Into<PathBuf>, metadata: VideoMetadata) {
        let count = metadata.frame_count;
        self.add_source(path, MockFrameSource::blank(metadata, count));
    }

    pub fn add_source(&self, path: impl Into<PathBuf>, source: MockFrameSource) {
        self.videos
            .borrow_mut()
            .insert(path.into(), MockVideo::Playable(source));
    }

    /// Registers a path that exists but cannot be decoded.
    pub fn add_corrupt_video(&self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.videos
            .borrow_mut()
            .insert(path.into(), MockVideo::Corrupt(reason.into()));
    }

    /// Paths passed to `open`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.borrow().clone()
    }
}

impl FrameSourceOpener for MockSourceOpener {
    type Source = MockFrameSource;

    fn open(&self, path: &Path) -> CoreResult<Self::Source> {
        self.opened.borrow_mut().push(path.to_path_buf());
        match self.videos.borrow().get(path) {
            Some(MockVideo::Playable(source)) => Ok(source.clone()),
            Some(MockVideo::Corrupt(reason)) => Err(source_open_error(path, reason)),
            None => Err(source_open_error(path, "no mock video registered")),
        }
    }
}

// ============================================================================
// DETECTION MODELS
// ============================================================================

/// Canned answer of a `MockDetectionModel` for one frame.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(InferenceOutput),
    Failure(String),
}

/// A detection model answering per frame index.
///
/// Frames without a registered response produce an empty output. Clones
/// share the call log.
#[derive(Debug, Clone, Default)]
pub struct MockDetectionModel {
    responses: HashMap<u64, MockResponse>,
    labels: HashMap<u32, String>,
    calls: Rc<RefCell<Vec<(u64, f32)>>>,
}

impl MockDetectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, frame_index: u64, output: InferenceOutput) -> Self {
        self.responses
            .insert(frame_index, MockResponse::Output(output));
        self
    }

    /// Shorthand for an output built from `(x1, y1, x2, y2, confidence, class_id)` tuples.
    pub fn with_boxes(self, frame_index: u64, boxes: &[(f32, f32, f32, f32, f32, u32)]) -> Self {
        self.with_output(frame_index, InferenceOutput::from_boxes(boxes))
    }

    pub fn with_failure(mut self, frame_index: u64, reason: impl Into<String>) -> Self {
        self.responses
            .insert(frame_index, MockResponse::Failure(reason.into()));
        self
    }

    pub fn with_label(mut self, class_id: u32, name: impl Into<String>) -> Self {
        self.labels.insert(class_id, name.into());
        self
    }

    /// Shared handle to the `(frame index, confidence threshold)` of every
    /// `infer` call.
    pub fn call_log(&self) -> Rc<RefCell<Vec<(u64, f32)>>> {
        Rc::clone(&self.calls)
    }
}

impl DetectionModel for MockDetectionModel {
    fn infer(&mut self, frame: &Frame, confidence_threshold: f32) -> CoreResult<InferenceOutput> {
        self.calls
            .borrow_mut()
            .push((frame.index, confidence_threshold));
        match self.responses.get(&frame.index) {
            Some(MockResponse::Output(output)) => Ok(output.clone()),
            Some(MockResponse::Failure(reason)) => Err(CoreError::Inference(reason.clone())),
            None => Ok(InferenceOutput::empty()),
        }
    }

    fn class_name(&self, class_id: u32) -> Option<String> {
        self.labels.get(&class_id).cloned()
    }
}

/// Hands out `MockDetectionModel`s by detector name.
///
/// Detectors without a registered model get an empty one.
#[derive(Debug, Clone, Default)]
pub struct MockModelLoader {
    models: HashMap<String, MockDetectionModel>,
    failures: HashMap<String, String>,
    loaded: Rc<RefCell<Vec<String>>>,
}

impl MockModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, detector_name: impl Into<String>, model: MockDetectionModel) -> Self {
        self.models.insert(detector_name.into(), model);
        self
    }

    pub fn with_failure(mut self, detector_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.insert(detector_name.into(), reason.into());
        self
    }

    /// Names of the detectors loaded so far, in load order.
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.borrow().clone()
    }
}

impl ModelLoader for MockModelLoader {
    fn load(&self, config: &DetectorConfig) -> CoreResult<Box<dyn DetectionModel>> {
        if let Some(reason) = self.failures.get(&config.name) {
            return Err(model_load_error(&config.model_reference, reason));
        }
        self.loaded.borrow_mut().push(config.name.clone());
        let model = self.models.get(&config.name).cloned().unwrap_or_default();
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_serves_frames_then_ends() -> CoreResult<()> {
        let mut source = MockFrameSource::blank(VideoMetadata::new(4, 2, 30.0, 0), 2);
        assert_eq!(source.next_frame()?.map(|f| f.index), Some(0));
        assert_eq!(source.next_frame()?.map(|f| f.data.len()), Some(24));
        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn test_mock_source_trailing_error() {
        let mut source = MockFrameSource::blank(VideoMetadata::new(4, 2, 30.0, 1), 0)
            .with_trailing_error("truncated");
        assert!(matches!(source.next_frame(), Err(CoreError::Decode(_))));
        assert!(matches!(source.next_frame(), Ok(None)));
    }

    #[test]
    fn test_mock_opener_unknown_and_corrupt_paths() {
        let opener = MockSourceOpener::new();
        opener.add_corrupt_video("/videos/bad.mp4", "moov atom not found");
        assert!(opener.open(Path::new("/videos/bad.mp4")).is_err());
        assert!(opener.open(Path::new("/videos/missing.mp4")).is_err());
        assert_eq!(opener.opened().len(), 2);
    }
}
