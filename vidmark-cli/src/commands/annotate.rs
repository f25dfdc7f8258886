//! Implementation of the 'annotate' subcommand.
//!
//! This module turns CLI arguments into a pipeline configuration, checks the
//! external tools, and delegates single-video or batch annotation to the
//! vidmark-core library. It returns the process exit code.

use crate::cli::AnnotateArgs;
use crate::config::{DEFAULT_FACE_CLASSES, EXIT_FAILURE, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::error::{CliErrorContext, CliResult};

use vidmark_core::config::{
    DetectorConfig, FACE_DETECTOR_NAME, LICENSE_PLATE_DETECTOR_NAME, PipelineConfig,
    PipelineConfigBuilder, load_detector_configs,
};
use vidmark_core::external::{DefaultModelLoader, SidecarSourceOpener, check_dependency};
use vidmark_core::processing::BatchReport;
use vidmark_core::utils::annotation_output_path;
use vidmark_core::{AnnotationDocument, AnnotationPipeline, BatchOutcome, CoreError, terminal};

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

/// Which videos a run covers.
#[derive(Debug, Clone, PartialEq)]
pub enum RunTarget {
    Single { video: PathBuf, output: PathBuf },
    Batch { files: Vec<PathBuf> },
}

/// Builds the detector list: the file given by `--detectors`, or the face
/// and license plate defaults.
pub fn build_detectors(args: &AnnotateArgs) -> CliResult<Vec<DetectorConfig>> {
    if let Some(path) = &args.detectors {
        return load_detector_configs(path);
    }

    let mut face = DetectorConfig::new(FACE_DETECTOR_NAME, args.face_model.clone())
        .with_confidence(args.confidence)
        .with_classes(DEFAULT_FACE_CLASSES.iter().copied());
    let mut plate = DetectorConfig::new(LICENSE_PLATE_DETECTOR_NAME, args.license_model.clone())
        .with_confidence(args.confidence);

    if let Some(device) = &args.device {
        face = face.with_device(device.clone());
        plate = plate.with_device(device.clone());
    }

    Ok(vec![face, plate])
}

/// Creates the pipeline configuration from CLI arguments.
pub fn create_pipeline_config(args: &AnnotateArgs) -> CliResult<PipelineConfig> {
    let mut builder = PipelineConfigBuilder::new()
        .detectors(build_detectors(args)?)
        .sample_rate(args.sample_rate)
        .aspect_ratio_filter(args.aspect_filter)
        .show_progress(!args.no_progress);

    if let Some(area) = args.min_box_area {
        builder = builder.min_box_area(area);
    }
    if let Some(area) = args.max_box_area {
        builder = builder.max_box_area(area);
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

/// Resolves the videos to annotate and, for a single video, its output file.
pub fn resolve_target(args: &AnnotateArgs) -> CliResult<RunTarget> {
    if let Some(video) = &args.video {
        if !video.is_file() {
            return Err(CoreError::SourceNotFound(video.display().to_string()));
        }
        let output = match &args.output {
            Some(path) => path.clone(),
            None => annotation_output_path(video, &args.output_dir)?,
        };
        return Ok(RunTarget::Single {
            video: video.clone(),
            output,
        });
    }

    match vidmark_core::find_processable_files(&args.videos_dir) {
        Ok(files) => Ok(RunTarget::Batch { files }),
        Err(CoreError::NoFilesFound) => Ok(RunTarget::Batch { files: Vec::new() }),
        Err(e) => Err(e).cli_with_context(|| {
            format!("Failed to read videos directory '{}'", args.videos_dir.display())
        }),
    }
}

/// Maps a batch outcome to the process exit code.
pub fn exit_code(outcome: BatchOutcome) -> i32 {
    match outcome {
        BatchOutcome::AllSucceeded => EXIT_SUCCESS,
        BatchOutcome::PartialSuccess => EXIT_PARTIAL,
        BatchOutcome::AllFailed => EXIT_FAILURE,
    }
}

/// Main entry point for the annotate command. Returns the exit code.
pub fn run_annotate(args: AnnotateArgs) -> CliResult<i32> {
    let start_time = Instant::now();

    // ========================================================================
    // STEP 1: RESOLVE INPUTS AND BIND DETECTORS
    // ========================================================================

    let target = resolve_target(&args)?;
    if matches!(&target, RunTarget::Batch { files } if files.is_empty()) {
        terminal::print_warning(&format!(
            "No video files found in {}",
            args.videos_dir.display()
        ));
        return Ok(EXIT_SUCCESS);
    }

    let config = create_pipeline_config(&args)?;
    display_initialization_info(&args, &target, &config);

    let mut pipeline = AnnotationPipeline::new(config, SidecarSourceOpener, &DefaultModelLoader)?;

    // ========================================================================
    // STEP 2: CHECK EXTERNAL TOOLS
    // ========================================================================

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    // ========================================================================
    // STEP 3: ANNOTATE
    // ========================================================================

    let code = match target {
        RunTarget::Single { video, output } => {
            let document = pipeline.run(&video, Some(&output))?;
            display_document_summary(&document, &output);
            EXIT_SUCCESS
        }
        RunTarget::Batch { files } => {
            let report = vidmark_core::process_videos(&mut pipeline, &files, &args.output_dir);
            display_batch_summary(&report);
            exit_code(report.outcome())
        }
    };

    debug!(
        "annotate finished with exit code {} after {}",
        code,
        vidmark_core::format_duration(start_time.elapsed().as_secs_f64())
    );
    Ok(code)
}

fn display_initialization_info(args: &AnnotateArgs, target: &RunTarget, config: &PipelineConfig) {
    terminal::print_section("Initialization");
    match target {
        RunTarget::Single { video, output } => {
            terminal::print_status("Video", &video.display().to_string(), false);
            terminal::print_status("Output", &output.display().to_string(), false);
        }
        RunTarget::Batch { files } => {
            terminal::print_status("Videos", &args.videos_dir.display().to_string(), false);
            terminal::print_status("Files", &files.len().to_string(), false);
            terminal::print_status("Output", &args.output_dir.display().to_string(), false);
        }
    }

    for detector in &config.detectors {
        terminal::print_status(
            &format!("Detector {}", detector.name),
            &format!(
                "{} (confidence {:.2})",
                detector.model_reference, detector.confidence_threshold
            ),
            false,
        );
    }
    if config.sample_rate > 1 {
        terminal::print_status("Sample rate", &format!("every {} frames", config.sample_rate), false);
    }
    if config.box_filter.is_active() {
        info!("Box filters: {:?}", config.box_filter);
    }
}

fn display_document_summary(document: &AnnotationDocument, output: &Path) {
    let stats = &document.statistics;
    terminal::print_section("Summary");
    terminal::print_status("Detections", &stats.total_detections.to_string(), true);
    terminal::print_status(
        "Frames with detections",
        &format!("{} of {}", stats.frames_with_detections, stats.frames_sampled),
        false,
    );
    for (name, count) in &stats.detections_by_detector {
        terminal::print_sub_item(&format!("{name}: {count}"));
    }
    terminal::print_status(
        "Processing time",
        &vidmark_core::format_duration(stats.processing_time),
        false,
    );
    if output.is_file() {
        terminal::print_success(&format!("Annotations saved to {}", output.display()));
    } else {
        warn!("Annotations were not written to {}", output.display());
    }
}

fn display_batch_summary(report: &BatchReport) {
    terminal::print_section("Summary");
    terminal::print_status(
        "Processed",
        &format!("{} of {} videos", report.succeeded.len(), report.total()),
        false,
    );
    terminal::print_status("Detections", &report.total_detections().to_string(), true);

    for result in &report.succeeded {
        terminal::print_sub_item(&format!(
            "{}: {} detection(s), {}",
            result.video.display(),
            result.total_detections,
            vidmark_core::format_duration(result.processing_time.as_secs_f64())
        ));
    }

    if !report.failed.is_empty() {
        terminal::print_status("Failed", &report.failed.len().to_string(), true);
        for failure in &report.failed {
            terminal::print_sub_item(&format!("{}: {}", failure.video.display(), failure.error));
        }
    }

    match report.outcome() {
        BatchOutcome::AllSucceeded => terminal::print_success("All videos annotated"),
        BatchOutcome::PartialSuccess => terminal::print_warning("Some videos failed"),
        BatchOutcome::AllFailed => terminal::print_warning("No video could be annotated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> AnnotateArgs {
        let mut argv = vec!["vidmark", "annotate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv) {
            Ok(Cli {
                command: Commands::Annotate(args),
            }) => args,
            Err(e) => panic!("failed to parse arguments: {e}"),
        }
    }

    #[test]
    fn test_default_detectors() -> CliResult<()> {
        let args = parse(&["--confidence", "0.4", "--device", "cpu"]);
        let detectors = build_detectors(&args)?;

        assert_eq!(detectors.len(), 2);
        assert_eq!(detectors[0].name, FACE_DETECTOR_NAME);
        assert!(detectors[0].accepted_classes.contains("face"));
        assert_eq!(detectors[1].name, LICENSE_PLATE_DETECTOR_NAME);
        assert!(detectors[1].accepted_classes.is_empty());
        assert!(detectors.iter().all(|d| d.confidence_threshold == 0.4));
        assert!(detectors.iter().all(|d| d.device_hint.as_deref() == Some("cpu")));
        Ok(())
    }

    #[test]
    fn test_detector_file_replaces_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("detectors.json");
        fs::write(&path, r#"[{"name": "logo", "model": "logo.onnx"}]"#)?;

        let args = parse(&["--detectors", path.to_str().unwrap_or_default()]);
        let detectors = build_detectors(&args)?;
        assert_eq!(detectors.len(), 1);
        assert_eq!(detectors[0].name, "logo");
        Ok(())
    }

    #[test]
    fn test_pipeline_config_filters() -> CliResult<()> {
        let args = parse(&[
            "--sample-rate",
            "3",
            "--min-box-area",
            "0.01",
            "--aspect-filter",
            "--no-progress",
        ]);
        let config = create_pipeline_config(&args)?;
        assert_eq!(config.sample_rate, 3);
        assert_eq!(config.box_filter.min_area, Some(0.01));
        assert_eq!(config.box_filter.max_area, None);
        assert!(config.box_filter.aspect_ratio);
        assert!(!config.show_progress);
        Ok(())
    }

    #[test]
    fn test_invalid_box_area_rejected() {
        let args = parse(&["--min-box-area", "0.5", "--max-box-area", "0.1"]);
        assert!(matches!(create_pipeline_config(&args), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_resolve_single_video_default_output() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let video = dir.path().join("street.mp4");
        fs::write(&video, b"not really a video")?;

        let args = parse(&[
            "--video",
            video.to_str().unwrap_or_default(),
            "--output-dir",
            "out",
        ]);
        let target = resolve_target(&args)?;
        assert_eq!(
            target,
            RunTarget::Single {
                video: video.clone(),
                output: PathBuf::from("out/street_annotations.json"),
            }
        );
        Ok(())
    }

    #[test]
    fn test_resolve_missing_video() {
        let args = parse(&["--video", "no/such/video.mp4"]);
        assert!(matches!(resolve_target(&args), Err(CoreError::SourceNotFound(_))));
    }

    #[test]
    fn test_resolve_batch() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.mov"), b"")?;
        fs::write(dir.path().join("a.mp4"), b"")?;
        fs::write(dir.path().join("notes.txt"), b"")?;

        let args = parse(&["--videos-dir", dir.path().to_str().unwrap_or_default()]);
        match resolve_target(&args)? {
            RunTarget::Batch { files } => {
                assert_eq!(files, vec![dir.path().join("a.mp4"), dir.path().join("b.mov")]);
            }
            other => panic!("unexpected target {other:?}"),
        }

        let empty = tempdir()?;
        let args = parse(&["--videos-dir", empty.path().to_str().unwrap_or_default()]);
        assert_eq!(resolve_target(&args)?, RunTarget::Batch { files: Vec::new() });
        Ok(())
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_default_loader_has_inference_backend() {
        use vidmark_core::external::ModelLoader;

        let config = DetectorConfig::new(FACE_DETECTOR_NAME, "no/such/face-model.onnx");
        match DefaultModelLoader.load(&config) {
            Ok(_) => panic!("a missing model file must not load"),
            Err(e) => {
                assert!(matches!(e, CoreError::ModelLoad { .. }));
                assert!(!e.to_string().contains("no inference backend"));
            }
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(BatchOutcome::AllSucceeded), 0);
        assert_eq!(exit_code(BatchOutcome::PartialSuccess), 2);
        assert_eq!(exit_code(BatchOutcome::AllFailed), 1);
    }
}
