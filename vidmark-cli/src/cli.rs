// vidmark-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use crate::config::{
    DEFAULT_FACE_MODEL, DEFAULT_LICENSE_PLATE_MODEL, DEFAULT_OUTPUT_DIR, DEFAULT_VIDEOS_DIR,
};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Vidmark: Video annotation tool",
    long_about = "Runs face and license plate detectors over videos and writes per-frame \
                  bounding-box annotations as JSON via the vidmark-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotates a single video or every video in a directory
    Annotate(AnnotateArgs),
}

#[derive(Parser, Debug)]
pub struct AnnotateArgs {
    // --- Input / Output ---
    /// Annotate this video only (otherwise every video in --videos-dir)
    #[arg(short = 'v', long = "video", value_name = "FILE", conflicts_with = "videos_dir")]
    pub video: Option<PathBuf>,

    /// Directory scanned for videos in batch mode
    #[arg(long = "videos-dir", value_name = "DIR", default_value = DEFAULT_VIDEOS_DIR)]
    pub videos_dir: PathBuf,

    /// Output JSON file for --video (defaults to OUTPUT_DIR/<name>_annotations.json)
    #[arg(short = 'o', long = "output", value_name = "FILE", requires = "video")]
    pub output: Option<PathBuf>,

    /// Directory where annotation files are written
    #[arg(long = "output-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Optional: Directory for log files (defaults to OUTPUT_DIR/logs)
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    // --- Detectors ---
    /// Face detection model
    #[arg(long = "face-model", value_name = "MODEL", default_value = DEFAULT_FACE_MODEL)]
    pub face_model: String,

    /// License plate detection model
    #[arg(long = "license-model", value_name = "MODEL", default_value = DEFAULT_LICENSE_PLATE_MODEL)]
    pub license_model: String,

    /// Optional: JSON file with a list of detectors, replacing the face and
    /// license plate defaults
    #[arg(long = "detectors", value_name = "JSON_FILE")]
    pub detectors: Option<PathBuf>,

    /// Confidence threshold for the default detectors (0.0-1.0).
    /// Can also be set via the VIDMARK_CONFIDENCE environment variable.
    #[arg(
        short = 'c',
        long,
        value_name = "THRESHOLD",
        default_value_t = vidmark_core::config::DEFAULT_CONFIDENCE_THRESHOLD,
        env = "VIDMARK_CONFIDENCE"
    )]
    pub confidence: f32,

    /// Optional: Device hint passed to the default detectors (e.g. "cpu", "0")
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    // --- Sampling and Filters ---
    /// Run detectors on every Nth frame only
    #[arg(
        long = "sample-rate",
        value_name = "N",
        default_value_t = vidmark_core::config::DEFAULT_SAMPLE_RATE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub sample_rate: u32,

    /// Optional: Drop boxes smaller than this fraction of the frame area
    #[arg(long = "min-box-area", value_name = "FRACTION")]
    pub min_box_area: Option<f64>,

    /// Optional: Drop boxes larger than this fraction of the frame area
    #[arg(long = "max-box-area", value_name = "FRACTION")]
    pub max_box_area: Option<f64>,

    /// Keep only boxes with a width/height ratio between 0.5 and 2.0
    #[arg(long = "aspect-filter", default_value_t = false)]
    pub aspect_filter: bool,

    // --- Output Verbosity ---
    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Disable the frame progress bar
    #[arg(long = "no-progress", default_value_t = false)]
    pub no_progress: bool,
}
