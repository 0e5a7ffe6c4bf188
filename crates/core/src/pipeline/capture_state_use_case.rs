use crate::cube::face_layout::assemble;
use crate::cube::orientation_resolver::resolve;
use crate::detection::detection_pipeline::DetectionPipeline;
use crate::detection::domain::frame_source::FrameSource;
use crate::detection::domain::sticker_region::RegionConfig;
use crate::pipeline::cube_state::{unix_timestamp, CubeState};

/// Detect → assemble → resolve, producing a [`CubeState`].
pub struct CaptureStateUseCase {
    pipeline: DetectionPipeline,
}

impl CaptureStateUseCase {
    pub fn new(pipeline: DetectionPipeline) -> Self {
        Self { pipeline }
    }

    pub fn execute(&self, source: &dyn FrameSource, regions: &RegionConfig) -> CubeState {
        let detections = self.pipeline.detect_all(source, regions);
        let (faces, complete) = assemble(&detections);

        let (solver_input, solver_error) = if complete {
            match resolve(&faces) {
                Ok(facelets) => (Some(facelets), None),
                Err(e) => {
                    log::warn!("Complete layout did not resolve: {e}");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        log::info!(
            "Captured cube state: complete={complete}, resolved={}",
            solver_input.is_some()
        );

        CubeState {
            captured_at: Some(unix_timestamp()),
            faces,
            complete,
            solver_input,
            solver_error,
            detections,
        }
    }
}

impl Default for CaptureStateUseCase {
    fn default() -> Self {
        Self::new(DetectionPipeline::default())
    }
}
