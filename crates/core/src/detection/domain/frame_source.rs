use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// Supplies the latest frame for a camera.
///
/// `None` means no imaging is available for that camera at all; the
/// detection pipeline then reports every region as unknown.
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self, camera_id: CameraId) -> Option<Frame>;
}
