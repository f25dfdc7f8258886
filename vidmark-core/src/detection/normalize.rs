// ============================================================================
// vidmark-core/src/detection/normalize.rs
// ============================================================================
//
// DETECTION NORMALIZER: Pixel Boxes to Frame-Relative Boxes
//
// Converts one raw, pixel-space detection into a box expressed as fractions
// of the frame, after applying the owning detector's class filter. The
// function is pure: the same inputs always give the same output.
//
// STEPS (order matters):
// 1. Class filter against the detector's accepted classes
// 2. Corner coordinates to x/y/width/height fractions
// 3. Clamp x/y into [0, 1], then width/height against the clamped x/y
// 4. Confidence pass-through, MISSING_CONFIDENCE when absent

use crate::config::DetectorConfig;
use crate::detection::types::RawDetection;

/// Confidence recorded for boxes whose detector reported no score.
pub const MISSING_CONFIDENCE: f64 = 0.0;

/// A box normalized to frame dimensions.
///
/// Invariants: `0 <= x <= 1`, `0 <= y <= 1`, `x + width <= 1`,
/// `y + height <= 1`, `0 <= confidence <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

impl NormalizedBox {
    /// Area as a fraction of the frame area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Width over height, `None` for boxes with no height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }
}

/// Returns true when `class_name` passes the detector's class filter.
///
/// An empty accepted set accepts everything, including detections with no
/// resolved class name.
pub fn accepts_class(config: &DetectorConfig, class_name: Option<&str>) -> bool {
    if config.accepted_classes.is_empty() {
        return true;
    }
    class_name.is_some_and(|name| config.accepted_classes.contains(name))
}

/// Normalizes `raw` against a `frame_width` x `frame_height` frame.
///
/// Returns `None` when the detection is rejected by the class filter or the
/// frame has a zero dimension.
pub fn normalize(
    raw: &RawDetection,
    frame_width: u32,
    frame_height: u32,
    config: &DetectorConfig,
) -> Option<NormalizedBox> {
    if !accepts_class(config, raw.class_name.as_deref()) {
        return None;
    }
    if frame_width == 0 || frame_height == 0 {
        return None;
    }

    let w = f64::from(frame_width);
    let h = f64::from(frame_height);
    let (x1, y1) = (f64::from(raw.x1), f64::from(raw.y1));
    let (x2, y2) = (f64::from(raw.x2), f64::from(raw.y2));

    let x = (x1 / w).clamp(0.0, 1.0);
    let y = (y1 / h).clamp(0.0, 1.0);
    let width = ((x2 - x1) / w).clamp(0.0, 1.0 - x);
    let height = ((y2 - y1) / h).clamp(0.0, 1.0 - y);

    let confidence = raw
        .confidence
        .map(f64::from)
        .filter(|c| c.is_finite())
        .map_or(MISSING_CONFIDENCE, |c| c.clamp(0.0, 1.0));

    Some(NormalizedBox {
        x,
        y,
        width,
        height,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn face_detector() -> DetectorConfig {
        DetectorConfig::new("face", "face.onnx").with_classes(["face"])
    }

    fn open_detector() -> DetectorConfig {
        DetectorConfig::new("license_plate", "plate.onnx")
    }

    fn assert_in_bounds(b: &NormalizedBox) {
        assert!((0.0..=1.0).contains(&b.x), "x out of range: {b:?}");
        assert!((0.0..=1.0).contains(&b.y), "y out of range: {b:?}");
        assert!(b.width >= 0.0 && b.height >= 0.0, "negative size: {b:?}");
        assert!(b.x + b.width <= 1.0 + EPS, "box exceeds right edge: {b:?}");
        assert!(b.y + b.height <= 1.0 + EPS, "box exceeds bottom edge: {b:?}");
        assert!((0.0..=1.0).contains(&b.confidence), "confidence out of range: {b:?}");
    }

    #[test]
    fn test_normalize_basic_box() {
        let raw = RawDetection::new(10.0, 10.0, 50.0, 50.0)
            .with_confidence(0.9)
            .with_class(0, "face");
        let b = normalize(&raw, 100, 100, &face_detector()).expect("box should be kept");

        assert!((b.x - 0.1).abs() < EPS);
        assert!((b.y - 0.1).abs() < EPS);
        assert!((b.width - 0.4).abs() < EPS);
        assert!((b.height - 0.4).abs() < EPS);
        assert!((b.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_clamps_oversized_box() {
        let raw = RawDetection::new(0.0, 0.0, 200.0, 200.0)
            .with_confidence(0.8)
            .with_class(0, "face");
        let b = normalize(&raw, 100, 100, &face_detector()).expect("box should be kept");

        assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_normalize_clamps_noisy_coordinates() {
        let cases = [
            RawDetection::new(-30.0, -5.0, 40.0, 20.0),
            RawDetection::new(90.0, 95.0, 150.0, 130.0),
            RawDetection::new(60.0, 60.0, 20.0, 10.0), // inverted corners
            RawDetection::new(150.0, 150.0, 300.0, 300.0),
            RawDetection::new(0.0, 0.0, 0.0, 0.0).with_confidence(1.7),
            RawDetection::new(5.0, 5.0, 10.0, 10.0).with_confidence(-0.2),
        ];
        for raw in &cases {
            let b = normalize(raw, 100, 80, &open_detector()).expect("no class filter");
            assert_in_bounds(&b);
        }
    }

    #[test]
    fn test_width_clamped_against_clamped_x() {
        let raw = RawDetection::new(80.0, 0.0, 180.0, 10.0);
        let b = normalize(&raw, 100, 100, &open_detector()).expect("no class filter");
        assert!((b.x - 0.8).abs() < EPS);
        assert!((b.width - 0.2).abs() < EPS);
    }

    #[test]
    fn test_class_filter() {
        let plate = RawDetection::new(1.0, 1.0, 5.0, 5.0).with_class(1, "plate");
        assert!(normalize(&plate, 100, 100, &face_detector()).is_none());
        assert!(normalize(&plate, 100, 100, &open_detector()).is_some());

        let unlabeled = RawDetection::new(1.0, 1.0, 5.0, 5.0);
        assert!(normalize(&unlabeled, 100, 100, &face_detector()).is_none());
        assert!(normalize(&unlabeled, 100, 100, &open_detector()).is_some());
    }

    #[test]
    fn test_missing_confidence_uses_default() {
        let raw = RawDetection::new(1.0, 1.0, 5.0, 5.0);
        let b = normalize(&raw, 100, 100, &open_detector()).expect("no class filter");
        assert_eq!(b.confidence, MISSING_CONFIDENCE);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = RawDetection::new(12.5, 33.0, 71.0, 99.0)
            .with_confidence(0.42)
            .with_class(0, "face");
        let first = normalize(&raw, 640, 360, &face_detector());
        let second = normalize(&raw, 640, 360, &face_detector());
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_sized_frame_is_rejected() {
        let raw = RawDetection::new(1.0, 1.0, 5.0, 5.0);
        assert!(normalize(&raw, 0, 100, &open_detector()).is_none());
    }
}
