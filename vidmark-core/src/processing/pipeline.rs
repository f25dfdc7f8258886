// ============================================================================
// vidmark-core/src/processing/pipeline.rs
// ============================================================================
//
// VIDEO PIPELINE DRIVER: Annotating One Video End to End
//
// `AnnotationPipeline` owns the bound detectors and drives a frame source
// from start to exhaustion, handing each sampled frame to the aggregator and
// collecting the non-empty results into an `AnnotationDocument`.
//
// WORKFLOW:
// 1. Check the video exists and open it through the frame source opener
// 2. Build the document header from the source metadata
// 3. Read frames until the source is exhausted, running detectors on every
//    `sample_rate`-th frame. A source that fails before its first frame is
//    treated as unopenable; a later failure ends the video early
// 4. Finalize statistics
// 5. Optionally save the document (a save failure is logged, not returned)
//
// The advisory frame count from the container only feeds progress output;
// the loop always runs until the source says it is done.
//
// AI-ASSISTANT-INFO: Per-video annotation driver

// ---- Internal crate imports ----
use crate::config::{PROGRESS_INTERVAL_FRAMES, PipelineConfig};
use crate::detection::Detector;
use crate::document::{AnnotationDocument, ProcessingSettings, VideoInfo, save_document};
use crate::error::{CoreError, CoreResult, source_open_error};
use crate::external::{FrameSource, FrameSourceOpener, ModelLoader};
use crate::processing::aggregate::FrameAggregator;
use crate::terminal::FrameProgress;
use crate::utils::format_duration;

// ---- External crate imports ----
use log::{debug, error, info, warn};

// ---- Standard library imports ----
use std::path::Path;
use std::time::Instant;

/// Annotates videos with a fixed set of bound detectors.
///
/// # Examples
///
/// ```rust
/// use vidmark_core::config::{DetectorConfig, PipelineConfigBuilder};
/// use vidmark_core::detection::VideoMetadata;
/// use vidmark_core::external::mocks::{MockModelLoader, MockSourceOpener};
/// use vidmark_core::processing::AnnotationPipeline;
///
/// let config = PipelineConfigBuilder::new()
///     .detector(DetectorConfig::new("face", "hub:face"))
///     .show_progress(false)
///     .build();
///
/// let opener = MockSourceOpener::new();
/// let pipeline = AnnotationPipeline::new(config, opener, &MockModelLoader::new()).unwrap();
/// assert_eq!(pipeline.detector_names(), vec!["face"]);
/// ```
pub struct AnnotationPipeline<O: FrameSourceOpener> {
    config: PipelineConfig,
    opener: O,
    detectors: Vec<Detector>,
    aggregator: FrameAggregator,
}

impl<O: FrameSourceOpener> AnnotationPipeline<O> {
    /// Validates `config` and binds every detector through `loader`.
    ///
    /// Any bind failure aborts construction; there are no partially bound
    /// pipelines.
    pub fn new<L: ModelLoader + ?Sized>(
        config: PipelineConfig,
        opener: O,
        loader: &L,
    ) -> CoreResult<Self> {
        config.validate()?;

        let detectors = config
            .detectors
            .iter()
            .cloned()
            .map(|detector_config| Detector::bind(detector_config, loader))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            aggregator: FrameAggregator::new(config.box_filter),
            config,
            opener,
            detectors,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Names of the bound detectors in run order.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(Detector::name).collect()
    }

    /// Annotates `video_path` and optionally saves the document to
    /// `output_path`.
    ///
    /// A failure to save is logged and the document is still returned.
    pub fn run(
        &mut self,
        video_path: &Path,
        output_path: Option<&Path>,
    ) -> CoreResult<AnnotationDocument> {
        let document = self.annotate(video_path)?;

        if let Some(destination) = output_path {
            match save_document(&document, destination) {
                Ok(()) => info!("Annotations saved to: {}", destination.display()),
                Err(e) => error!("{}", e),
            }
        }

        Ok(document)
    }

    /// Annotates `video_path` without saving anything.
    pub fn annotate(&mut self, video_path: &Path) -> CoreResult<AnnotationDocument> {
        let start_time = Instant::now();

        // ========================================================================
        // STEP 1: OPEN THE SOURCE
        // ========================================================================

        if !video_path.exists() {
            return Err(CoreError::SourceNotFound(video_path.display().to_string()));
        }
        let mut source = self.opener.open(video_path)?;
        let metadata = source.metadata().clone();

        let filename = video_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| video_path.display().to_string());

        info!(
            "Processing {}: {}x{}, {:.2} fps, {} frames",
            filename, metadata.width, metadata.height, metadata.fps, metadata.frame_count
        );

        // ========================================================================
        // STEP 2: DOCUMENT HEADER
        // ========================================================================

        let video_info = VideoInfo::new(filename, &metadata)
            .with_processing_settings(ProcessingSettings::from_config(&self.config));
        let mut document = AnnotationDocument::new(video_info);

        // ========================================================================
        // STEP 3: FRAME LOOP
        // ========================================================================

        let sample_rate = u64::from(self.config.sample_rate);
        let progress_interval = PROGRESS_INTERVAL_FRAMES * sample_rate;
        let progress = FrameProgress::new(metadata.frame_count, self.config.show_progress);

        let mut frames_read: u64 = 0;
        let mut frames_sampled: u64 = 0;
        let mut detections: u64 = 0;

        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) if frames_read == 0 => {
                    return Err(source_open_error(video_path, e));
                }
                Err(e) => {
                    warn!(
                        "Stopping {} after {} frame(s): {}",
                        video_path.display(),
                        frames_read,
                        e
                    );
                    break;
                }
            };

            let frame_index = frames_read;
            frames_read += 1;

            if frame_index % sample_rate == 0 {
                frames_sampled += 1;
                let annotations =
                    self.aggregator
                        .aggregate(&frame, frame_index, &mut self.detectors);
                detections += annotations.len() as u64;
                document.insert_frame(frame_index, annotations);
            }

            progress.set_position(frames_read, detections);
            if !progress.is_visible() && frame_index % progress_interval == 0 {
                let percent = if metadata.frame_count > 0 {
                    frame_index as f64 * 100.0 / metadata.frame_count as f64
                } else {
                    0.0
                };
                info!(
                    "Progress: {:.1}% ({}/{} frames), {} detection(s)",
                    percent, frame_index, metadata.frame_count, detections
                );
            }
        }
        progress.finish();

        // ========================================================================
        // STEP 4: STATISTICS
        // ========================================================================

        let names = self.detector_names();
        document.finalize(names, frames_read, frames_sampled, start_time.elapsed());

        let stats = &document.statistics;
        info!(
            "Finished {}: {} detection(s) on {} frame(s) in {}",
            video_path.display(),
            stats.total_detections,
            stats.frames_with_detections,
            format_duration(stats.processing_time)
        );
        for (name, count) in &stats.detections_by_detector {
            debug!("  {}: {} detection(s)", name, count);
        }
        if frames_read == 0 {
            warn!("No frames could be read from {}", video_path.display());
        }

        Ok(document)
    }
}
