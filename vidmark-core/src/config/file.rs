//! Detector set files.
//!
//! A detector file is a JSON array of `DetectorConfig` objects. It lets a
//! run use any number of detectors instead of the CLI's two defaults.

use super::DetectorConfig;
use crate::error::{CoreError, CoreResult};

use std::fs;
use std::path::Path;

/// Reads a JSON array of detector configurations from `path`.
///
/// Each entry is validated; duplicate names are left to
/// `PipelineConfig::validate`.
pub fn load_detector_configs(path: &Path) -> CoreResult<Vec<DetectorConfig>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!(
            "Failed to read detector file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let detectors: Vec<DetectorConfig> = serde_json::from_str(&contents).map_err(|e| {
        CoreError::Config(format!(
            "Invalid detector file '{}': {}",
            path.display(),
            e
        ))
    })?;

    for detector in &detectors {
        detector.validate()?;
    }

    log::debug!(
        "Loaded {} detector(s) from {}",
        detectors.len(),
        path.display()
    );
    Ok(detectors)
}

/// Writes detector configurations to `path` as pretty-printed JSON.
pub fn save_detector_configs(detectors: &[DetectorConfig], path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(detectors)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
    use tempfile::tempdir;

    #[test]
    fn test_load_detector_file_applies_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("detectors.json");
        fs::write(
            &path,
            r#"[
                {"name": "face", "model": "face.onnx", "confidence": 0.4, "classes": ["face"]},
                {"name": "license_plate", "model": "plate.onnx", "device": "0"}
            ]"#,
        )?;

        let detectors = load_detector_configs(&path)?;
        assert_eq!(detectors.len(), 2);
        assert_eq!(detectors[0].confidence_threshold, 0.4);
        assert!(detectors[0].accepted_classes.contains("face"));
        assert_eq!(detectors[1].confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert!(detectors[1].accepted_classes.is_empty());
        assert_eq!(detectors[1].device_hint.as_deref(), Some("0"));
        Ok(())
    }

    #[test]
    fn test_save_then_load_detector_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("detectors.json");
        let detectors = vec![
            DetectorConfig::new("face", "face.onnx")
                .with_classes(["face"])
                .with_labels_path("labels.txt"),
        ];

        save_detector_configs(&detectors, &path)?;
        assert_eq!(load_detector_configs(&path)?, detectors);
        Ok(())
    }

    #[test]
    fn test_invalid_detector_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("detectors.json");
        fs::write(&path, r#"[{"name": "", "model": "face.onnx"}]"#)?;
        assert!(matches!(load_detector_configs(&path), Err(CoreError::Config(_))));

        fs::write(&path, "not json")?;
        assert!(matches!(load_detector_configs(&path), Err(CoreError::Config(_))));
        Ok(())
    }
}
