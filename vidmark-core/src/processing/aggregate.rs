// ============================================================================
// vidmark-core/src/processing/aggregate.rs
// ============================================================================
//
// FRAME AGGREGATOR: Merging Every Detector's Boxes for One Frame
//
// Runs each bound detector over a frame in configuration order, normalizes
// and filters every box, and assigns ids. The sequence number in an id is
// shared by all detectors on the frame and only counts accepted boxes, so
// ids on a frame are dense (`face_3_0`, `face_3_1`, `license_plate_3_2`).

// ---- Internal crate imports ----
use crate::config::BoxFilter;
use crate::detection::{Detector, Frame, normalize};
use crate::document::Annotation;

/// Combines per-detector results for a single frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAggregator {
    box_filter: BoxFilter,
}

impl FrameAggregator {
    pub fn new(box_filter: BoxFilter) -> Self {
        Self { box_filter }
    }

    /// Returns every accepted annotation for `frame`, detector by detector.
    ///
    /// `frame_index` is the position of the frame in the stream and becomes
    /// the middle part of each id.
    pub fn aggregate(
        &self,
        frame: &Frame,
        frame_index: u64,
        detectors: &mut [Detector],
    ) -> Vec<Annotation> {
        let mut annotations = Vec::new();

        for detector in detectors.iter_mut() {
            let raw_detections = detector.detect(frame);
            let before = annotations.len();

            for raw in &raw_detections {
                let Some(bbox) = normalize(raw, frame.width, frame.height, detector.config())
                else {
                    continue;
                };
                if !self.box_filter.accepts(&bbox) {
                    continue;
                }

                let id = format!("{}_{}_{}", detector.name(), frame_index, annotations.len());
                annotations.push(Annotation::new(id, &bbox, detector.name()));
            }

            let accepted = annotations.len() - before;
            if !raw_detections.is_empty() {
                log::trace!(
                    "Frame {}: detector '{}' kept {} of {} box(es)",
                    frame_index,
                    detector.name(),
                    accepted,
                    raw_detections.len()
                );
            }
        }

        annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::external::mocks::MockDetectionModel;
    use std::collections::HashSet;

    fn detector(name: &str, model: MockDetectionModel) -> Detector {
        Detector::from_model(DetectorConfig::new(name, format!("{name}.onnx")), Box::new(model))
    }

    #[test]
    fn test_shared_counter_across_detectors() {
        let mut detectors = vec![
            detector(
                "face",
                MockDetectionModel::new().with_boxes(
                    5,
                    &[(0.0, 0.0, 10.0, 10.0, 0.9, 0), (20.0, 20.0, 30.0, 30.0, 0.8, 0)],
                ),
            ),
            detector(
                "plate",
                MockDetectionModel::new().with_boxes(5, &[(40.0, 40.0, 60.0, 50.0, 0.7, 0)]),
            ),
        ];

        let annotations =
            FrameAggregator::default().aggregate(&Frame::blank(5, 100, 100), 5, &mut detectors);
        let ids: Vec<&str> = annotations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["face_5_0", "face_5_1", "plate_5_2"]);
        assert_eq!(annotations[2].label, "plate");
    }

    #[test]
    fn test_rejected_boxes_do_not_consume_ids() {
        let face = DetectorConfig::new("face", "face.onnx").with_classes(["face"]);
        let model = MockDetectionModel::new()
            .with_label(0, "face")
            .with_label(1, "person")
            .with_boxes(
                0,
                &[
                    (0.0, 0.0, 10.0, 10.0, 0.9, 1),
                    (0.0, 0.0, 10.0, 10.0, 0.9, 0),
                    (0.0, 0.0, 90.0, 10.0, 0.9, 0),
                ],
            );
        let mut detectors = vec![Detector::from_model(face, Box::new(model))];
        let aggregator = FrameAggregator::new(BoxFilter {
            aspect_ratio: true,
            ..BoxFilter::default()
        });

        let annotations = aggregator.aggregate(&Frame::blank(0, 100, 100), 0, &mut detectors);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id, "face_0_0");
    }

    #[test]
    fn test_ids_unique_within_frame() {
        let boxes: Vec<_> = (0..5)
            .map(|i| (i as f32, 0.0, i as f32 + 5.0, 5.0, 0.5, 0))
            .collect();
        let mut detectors = vec![
            detector("a", MockDetectionModel::new().with_boxes(1, &boxes)),
            detector("b", MockDetectionModel::new().with_boxes(1, &boxes)),
        ];

        let annotations =
            FrameAggregator::default().aggregate(&Frame::blank(1, 50, 50), 1, &mut detectors);
        let unique: HashSet<_> = annotations.iter().map(|a| &a.id).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_failing_detector_does_not_block_others() {
        let mut detectors = vec![
            detector("face", MockDetectionModel::new().with_failure(0, "boom")),
            detector(
                "plate",
                MockDetectionModel::new().with_boxes(0, &[(1.0, 1.0, 5.0, 5.0, 0.6, 0)]),
            ),
        ];

        let annotations =
            FrameAggregator::default().aggregate(&Frame::blank(0, 10, 10), 0, &mut detectors);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id, "plate_0_0");
    }
}
