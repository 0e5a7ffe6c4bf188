use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capture::capture_config::CaptureConfig;
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// Which backend currently feeds a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    None,
    Libcamera,
    V4l2,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::None => "none",
            SourceKind::Libcamera => "libcamera",
            SourceKind::V4l2 => "v4l2",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("{backend} is not available: {reason}")]
    Unavailable { backend: SourceKind, reason: String },
    #[error("Could not open camera {camera}: {reason}")]
    Open { camera: CameraId, reason: String },
    #[error("Frame read failed: {0}")]
    Read(String),
    #[error("Device release failed: {0}")]
    Close(String),
    #[error("No capture backend configured for camera {0}")]
    NoBackend(CameraId),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidSetting { key: String, value: String },
    #[error("Failed to start capture thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Opens capture devices of one kind.
///
/// A backend is owned by exactly one stream's acquisition thread, so
/// implementations only need to be `Send`.
pub trait CaptureBackend: Send {
    fn kind(&self) -> SourceKind;

    /// Opens the first usable device for `camera`.
    ///
    /// A returned handle has already produced at least one frame.
    fn open(
        &mut self,
        camera: CameraId,
        config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// An open device delivering RGB frames.
pub trait CaptureHandle: Send {
    /// Identifier of the open device, e.g. `/dev/video0` or a libcamera id.
    fn device(&self) -> &str;

    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<Frame, CaptureError>;

    fn close(&mut self) -> Result<(), CaptureError>;
}

const MAX_SUMMARY_CHARS: usize = 300;

/// Joins per-candidate failures into one bounded message.
pub fn summarize_failures(failures: &[String]) -> String {
    if failures.is_empty() {
        return "no candidates".to_string();
    }
    let joined = failures.join("; ");
    if joined.chars().count() <= MAX_SUMMARY_CHARS {
        return joined;
    }
    let mut truncated: String = joined.chars().take(MAX_SUMMARY_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SourceKind::V4l2).unwrap(), "\"v4l2\"");
        assert_eq!(serde_json::to_string(&SourceKind::None).unwrap(), "\"none\"");
        assert_eq!(SourceKind::Libcamera.to_string(), "libcamera");
    }

    #[test]
    fn test_summary_joins_reasons() {
        let failures = vec!["/dev/video0: busy".to_string(), "/dev/video2: no such device".to_string()];
        assert_eq!(
            summarize_failures(&failures),
            "/dev/video0: busy; /dev/video2: no such device"
        );
    }

    #[test]
    fn test_summary_is_bounded() {
        let failures: Vec<String> = (0..50).map(|i| format!("/dev/video{i}: timeout")).collect();
        let summary = summarize_failures(&failures);
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(summary.ends_with("..."));
        assert!(summary.starts_with("/dev/video0: timeout"));
    }

    #[test]
    fn test_summary_of_nothing() {
        assert_eq!(summarize_failures(&[]), "no candidates");
    }

    #[test]
    fn test_error_messages_name_the_camera() {
        let err = CaptureError::Open {
            camera: CameraId::new(1),
            reason: "busy".into(),
        };
        assert_eq!(err.to_string(), "Could not open camera 1: busy");
    }
}
