// ============================================================================
// vidmark-core/src/processing/batch.rs
// ============================================================================
//
// BATCH DRIVER: Annotating a List of Videos
//
// Runs one pipeline over many videos, one at a time, writing each document
// to `{stem}_annotations.json` in the output directory. A video that fails
// (cannot be opened, cannot be saved) is logged and recorded; the batch
// always moves on to the next file.

// ---- Internal crate imports ----
use crate::document::save_document;
use crate::error::CoreError;
use crate::external::FrameSourceOpener;
use crate::processing::pipeline::AnnotationPipeline;
use crate::terminal;
use crate::utils::annotation_output_path;

// ---- External crate imports ----
use log::{error, info};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A video that was annotated and saved.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResult {
    pub video: PathBuf,
    pub output: PathBuf,
    pub total_detections: u64,
    pub frames_with_detections: u64,
    pub processing_time: Duration,
}

/// A video that could not be annotated or saved.
#[derive(Debug)]
pub struct VideoFailure {
    pub video: PathBuf,
    pub error: CoreError,
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}

/// Per-video results of a batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<VideoResult>,
    pub failed: Vec<VideoFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// An empty batch counts as fully successful.
    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (_, true) => BatchOutcome::AllSucceeded,
            (true, false) => BatchOutcome::AllFailed,
            (false, false) => BatchOutcome::PartialSuccess,
        }
    }

    pub fn total_detections(&self) -> u64 {
        self.succeeded.iter().map(|r| r.total_detections).sum()
    }
}

/// Annotates every file in `files`, saving each document into `output_dir`.
pub fn process_videos<O: FrameSourceOpener>(
    pipeline: &mut AnnotationPipeline<O>,
    files: &[PathBuf],
    output_dir: &Path,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (position, video) in files.iter().enumerate() {
        terminal::print_processing(&format!(
            "[{}/{}] {}",
            position + 1,
            files.len(),
            video.display()
        ));

        match annotate_one(pipeline, video, output_dir) {
            Ok(result) => {
                info!(
                    "{}: {} detection(s) on {} frame(s)",
                    video.display(),
                    result.total_detections,
                    result.frames_with_detections
                );
                report.succeeded.push(result);
            }
            Err(e) => {
                error!("Failed to process {}: {}", video.display(), e);
                report.failed.push(VideoFailure {
                    video: video.clone(),
                    error: e,
                });
            }
        }
    }

    report
}

fn annotate_one<O: FrameSourceOpener>(
    pipeline: &mut AnnotationPipeline<O>,
    video: &Path,
    output_dir: &Path,
) -> Result<VideoResult, CoreError> {
    let output = annotation_output_path(video, output_dir)?;
    let document = pipeline.annotate(video)?;
    save_document(&document, &output)?;
    info!("Annotations saved to: {}", output.display());

    Ok(VideoResult {
        video: video.to_path_buf(),
        output,
        total_detections: document.statistics.total_detections,
        frames_with_detections: document.statistics.frames_with_detections,
        processing_time: Duration::from_secs_f64(document.statistics.processing_time),
    })
}
