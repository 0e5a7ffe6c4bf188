use crate::capture::capture_config::{BackendPreference, CaptureConfig};
use crate::capture::domain::capture_backend::{
    CaptureBackend, CaptureError, CaptureHandle, SourceKind,
};
use crate::shared::camera_id::CameraId;

use super::ffmpeg_capture::FfmpegCaptureBackend;

/// True when the crate was built with the `libcamera` feature.
pub fn hardware_available() -> bool {
    cfg!(feature = "libcamera")
}

/// Backends to try, in order.
///
/// `auto` tries the hardware stack (when built in) and the generic backend,
/// hardware first if `hardware_primary`. An explicit preference yields just
/// that backend even if it is not built in, so the failure is reported.
pub fn backend_order(
    preference: BackendPreference,
    hardware_primary: bool,
    hardware_available: bool,
) -> Vec<SourceKind> {
    match preference {
        BackendPreference::Libcamera => vec![SourceKind::Libcamera],
        BackendPreference::V4l2 => vec![SourceKind::V4l2],
        BackendPreference::Auto if !hardware_available => vec![SourceKind::V4l2],
        BackendPreference::Auto if hardware_primary => {
            vec![SourceKind::Libcamera, SourceKind::V4l2]
        }
        BackendPreference::Auto => vec![SourceKind::V4l2, SourceKind::Libcamera],
    }
}

/// Instantiates the backends `config` asks for.
pub fn create_backends(config: &CaptureConfig) -> Vec<Box<dyn CaptureBackend>> {
    backend_order(config.backend, config.hardware_primary, hardware_available())
        .into_iter()
        .filter_map(create_backend)
        .collect()
}

fn create_backend(kind: SourceKind) -> Option<Box<dyn CaptureBackend>> {
    match kind {
        SourceKind::None => None,
        SourceKind::V4l2 => Some(Box::new(FfmpegCaptureBackend::new())),
        SourceKind::Libcamera => Some(libcamera_backend()),
    }
}

#[cfg(feature = "libcamera")]
fn libcamera_backend() -> Box<dyn CaptureBackend> {
    Box::new(super::libcamera_capture::LibcameraCaptureBackend::new())
}

#[cfg(not(feature = "libcamera"))]
fn libcamera_backend() -> Box<dyn CaptureBackend> {
    Box::new(MissingBackend(SourceKind::Libcamera))
}

/// Stands in for a backend that was not compiled in.
#[cfg_attr(feature = "libcamera", allow(dead_code))]
struct MissingBackend(SourceKind);

impl CaptureBackend for MissingBackend {
    fn kind(&self) -> SourceKind {
        self.0
    }

    fn open(
        &mut self,
        _camera: CameraId,
        _config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        Err(CaptureError::Unavailable {
            backend: self.0,
            reason: format!("built without the `{}` feature", self.0),
        })
    }
}
