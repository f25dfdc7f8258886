// vidmark-core/tests/batch_tests.rs

use vidmark_core::config::{DetectorConfig, PipelineConfigBuilder};
use vidmark_core::detection::VideoMetadata;
use vidmark_core::discovery::find_processable_files;
use vidmark_core::document::load_document;
use vidmark_core::error::CoreError;
use vidmark_core::external::mocks::{
    MockDetectionModel, MockFrameSource, MockModelLoader, MockSourceOpener,
};
use vidmark_core::processing::{AnnotationPipeline, BatchOutcome, process_videos};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper to create a dummy file with some content
fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, b"dummy content").expect("Failed to write dummy content");
    file_path
}

fn face_pipeline(
    opener: MockSourceOpener,
    loader: &MockModelLoader,
) -> Result<AnnotationPipeline<MockSourceOpener>, CoreError> {
    let config = PipelineConfigBuilder::new()
        .detector(DetectorConfig::new("face", "hub:face"))
        .show_progress(false)
        .build();
    AnnotationPipeline::new(config, opener, loader)
}

#[test]
fn test_batch_with_one_valid_and_one_corrupt_video() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;

    let good = create_dummy_file(input_dir.path(), "good.mp4");
    let bad = create_dummy_file(input_dir.path(), "bad.avi");

    let opener = MockSourceOpener::new();
    opener.add_video(&good, VideoMetadata::new(100, 100, 30.0, 2));
    opener.add_corrupt_video(&bad, "Invalid data found when processing input");

    let loader = MockModelLoader::new().with_model(
        "face",
        MockDetectionModel::new().with_boxes(1, &[(10.0, 10.0, 30.0, 30.0, 0.9, 0)]),
    );
    let mut pipeline = face_pipeline(opener.clone(), &loader)?;

    let files = find_processable_files(input_dir.path())?;
    let report = process_videos(&mut pipeline, &files, output_dir.path());

    assert_eq!(report.outcome(), BatchOutcome::PartialSuccess);
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].video, bad);
    assert!(matches!(report.failed[0].error, CoreError::SourceOpen { .. }));

    // Both videos were attempted, in sorted order
    assert_eq!(opener.opened(), vec![bad.clone(), good.clone()]);

    let output = output_dir.path().join("good_annotations.json");
    assert_eq!(report.succeeded[0].output, output);
    let document = load_document(&output)?;
    assert_eq!(document.statistics.total_detections, 1);
    assert!(!output_dir.path().join("bad_annotations.json").exists());
    Ok(())
}

#[test]
fn test_batch_all_failed() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let files = vec![
        create_dummy_file(input_dir.path(), "one.mp4"),
        input_dir.path().join("missing.mp4"),
    ];

    let loader = MockModelLoader::new();
    let mut pipeline = face_pipeline(MockSourceOpener::new(), &loader)?;
    let report = process_videos(&mut pipeline, &files, output_dir.path());

    assert_eq!(report.outcome(), BatchOutcome::AllFailed);
    assert!(matches!(report.failed[1].error, CoreError::SourceNotFound(_)));
    Ok(())
}

#[test]
fn test_batch_save_failure_counts_as_failure() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let video = create_dummy_file(input_dir.path(), "clip.mkv");
    let blocked_output = create_dummy_file(input_dir.path(), "not-a-dir");

    let opener = MockSourceOpener::new();
    opener.add_video(&video, VideoMetadata::new(10, 10, 30.0, 1));
    let loader = MockModelLoader::new();
    let mut pipeline = face_pipeline(opener, &loader)?;

    let report = process_videos(&mut pipeline, &[video], &blocked_output);

    assert_eq!(report.outcome(), BatchOutcome::AllFailed);
    assert!(matches!(report.failed[0].error, CoreError::Persistence { .. }));
    Ok(())
}

#[test]
fn test_batch_documents_have_no_empty_frames() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let video = create_dummy_file(input_dir.path(), "quiet.mov");

    let opener = MockSourceOpener::new();
    opener.add_video(&video, VideoMetadata::new(10, 10, 0.0, 4));
    let loader = MockModelLoader::new();
    let mut pipeline = face_pipeline(opener, &loader)?;

    let report = process_videos(&mut pipeline, &[video], output_dir.path());
    assert_eq!(report.outcome(), BatchOutcome::AllSucceeded);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        output_dir.path().join("quiet_annotations.json"),
    )?)?;
    assert_eq!(json["annotations"], serde_json::json!({}));
    assert_eq!(json["video_info"]["fps"], 30);
    assert_eq!(json["statistics"]["average_detections_per_frame"], 0.0);
    Ok(())
}

#[test]
fn test_batch_undecodable_video_is_a_failure() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let video = create_dummy_file(input_dir.path(), "broken.mkv");

    let opener = MockSourceOpener::new();
    opener.add_source(
        &video,
        MockFrameSource::blank(VideoMetadata::new(100, 100, 30.0, 50), 0)
            .with_trailing_error("Decoder not found"),
    );
    let loader = MockModelLoader::new();
    let mut pipeline = face_pipeline(opener, &loader)?;

    let report = process_videos(&mut pipeline, &[video.clone()], output_dir.path());

    assert_eq!(report.outcome(), BatchOutcome::AllFailed);
    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed[0].video, video);
    assert!(matches!(report.failed[0].error, CoreError::SourceOpen { .. }));
    assert!(!output_dir.path().join("broken_annotations.json").exists());
    Ok(())
}
