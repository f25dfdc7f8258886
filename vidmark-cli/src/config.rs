// vidmark-cli/src/config.rs
//
// Defines default configuration constants for the `vidmark-cli` application,
// primarily the default locations of videos, models and output files.

pub const DEFAULT_VIDEOS_DIR: &str = "videos";
pub const DEFAULT_OUTPUT_DIR: &str = "assets-json";
pub const DEFAULT_FACE_MODEL: &str = "models/yolo11n-face.onnx";
pub const DEFAULT_LICENSE_PLATE_MODEL: &str = "models/license-plate-finetune-v1l.onnx";

/// Class names kept by the default face detector.
pub const DEFAULT_FACE_CLASSES: &[&str] = &["face"];

/// Name of the log directory created under the output directory.
pub const DEFAULT_LOG_SUBDIR: &str = "logs";

/// Process exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;
