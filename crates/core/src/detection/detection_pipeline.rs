use std::collections::BTreeMap;

use crate::detection::domain::color_classifier::{Classification, ColorClassifier};
use crate::detection::domain::frame_source::FrameSource;
use crate::detection::domain::region_sampler::{region_to_pixels, sample_mean_hsv};
use crate::detection::domain::sticker_detection::StickerDetection;
use crate::detection::domain::sticker_region::{RegionConfig, StickerRegion};
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// Detections keyed by the camera that produced them.
pub type DetectionSet = BTreeMap<CameraId, Vec<StickerDetection>>;

/// Samples every configured region of a frame and classifies its color.
pub struct DetectionPipeline {
    classifier: ColorClassifier,
}

impl DetectionPipeline {
    pub fn new(classifier: ColorClassifier) -> Self {
        Self { classifier }
    }

    /// Classifies each region of `frame`, in region order.
    ///
    /// Without a live frame every region comes back unknown with zero
    /// confidence. Placeholder canvases count as no frame.
    pub fn detect_frame(&self, frame: Option<&Frame>, regions: &[StickerRegion]) -> Vec<StickerDetection> {
        let Some(frame) = frame.filter(|f| f.is_valid() && !f.is_placeholder()) else {
            return regions
                .iter()
                .map(|r| StickerDetection::new(r, Classification::unknown()))
                .collect();
        };

        regions
            .iter()
            .map(|region| {
                let rect = region_to_pixels(region, frame.width(), frame.height());
                let sample = sample_mean_hsv(frame, rect);
                StickerDetection::new(region, self.classifier.classify(sample))
            })
            .collect()
    }

    pub fn detect_camera(
        &self,
        source: &dyn FrameSource,
        camera_id: CameraId,
        regions: &[StickerRegion],
    ) -> Vec<StickerDetection> {
        let frame = source.latest_frame(camera_id);
        self.detect_frame(frame.as_ref(), regions)
    }

    /// Runs detection for every camera present in the region snapshot.
    pub fn detect_all(&self, source: &dyn FrameSource, snapshot: &RegionConfig) -> DetectionSet {
        snapshot
            .iter()
            .map(|(&camera_id, regions)| (camera_id, self.detect_camera(source, camera_id, regions)))
            .collect()
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new(ColorClassifier::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cube::{ColorCode, Face};
    use std::collections::HashMap;

    struct StubFrameSource {
        frames: HashMap<CameraId, Frame>,
    }

    impl FrameSource for StubFrameSource {
        fn latest_frame(&self, camera_id: CameraId) -> Option<Frame> {
            self.frames.get(&camera_id).cloned()
        }
    }

    fn region(id: &str, face: Face, index: u8, x: f64) -> StickerRegion {
        StickerRegion {
            id: id.into(),
            face,
            index,
            x,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        }
    }

    /// Left half pure blue, right half pure yellow.
    fn split_frame() -> Frame {
        let (w, h) = (10u32, 4u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _ in 0..h {
            for col in 0..w {
                if col < w / 2 {
                    data.extend_from_slice(&[0, 40, 200]);
                } else {
                    data.extend_from_slice(&[220, 210, 20]);
                }
            }
        }
        Frame::new(data, w, h, 0)
    }

    #[test]
    fn test_detect_frame_classifies_each_region() {
        let pipeline = DetectionPipeline::default();
        let regions = vec![region("U0", Face::U, 0, 0.0), region("U1", Face::U, 1, 0.5)];

        let detections = pipeline.detect_frame(Some(&split_frame()), &regions);

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].color, ColorCode::Blue);
        assert_eq!(detections[1].color, ColorCode::Yellow);
        assert_eq!(detections[1].id, "U1");
        assert!(detections[0].confidence > 0.05);
    }

    #[test]
    fn test_missing_frame_yields_unknown_for_every_region() {
        let pipeline = DetectionPipeline::default();
        let regions = vec![region("D0", Face::D, 0, 0.0), region("D1", Face::D, 1, 0.5)];

        let detections = pipeline.detect_frame(None, &regions);

        assert_eq!(detections.len(), 2);
        for d in detections {
            assert_eq!(d.color, ColorCode::Unknown);
            assert_eq!(d.confidence, 0.0);
            assert_eq!(d.label, "?0%");
        }
    }

    #[test]
    fn test_placeholder_frame_is_not_sampled() {
        let pipeline = DetectionPipeline::default();
        let placeholder = Frame::placeholder(vec![240; 10 * 4 * 3], 10, 4);
        let regions = vec![region("F4", Face::F, 4, 0.0)];

        let detections = pipeline.detect_frame(Some(&placeholder), &regions);

        assert_eq!(detections[0].color, ColorCode::Unknown);
    }

    #[test]
    fn test_detect_all_fans_out_per_camera() {
        let source = StubFrameSource {
            frames: HashMap::from([(CameraId::new(0), split_frame())]),
        };
        let snapshot = RegionConfig::from([
            (CameraId::new(0), vec![region("U0", Face::U, 0, 0.0)]),
            (CameraId::new(1), vec![region("D0", Face::D, 0, 0.0)]),
        ]);

        let result = DetectionPipeline::default().detect_all(&source, &snapshot);

        assert_eq!(result.len(), 2);
        assert_eq!(result[&CameraId::new(0)][0].color, ColorCode::Blue);
        // Camera 1 has no frame at all.
        assert_eq!(result[&CameraId::new(1)][0].color, ColorCode::Unknown);
    }

    #[test]
    fn test_empty_region_list_yields_no_detections() {
        let detections = DetectionPipeline::default().detect_frame(Some(&split_frame()), &[]);
        assert!(detections.is_empty());
    }
}
