use std::collections::BTreeMap;

use crate::capture::camera_stream::{CameraStream, StreamStatus};
use crate::capture::capture_config::CaptureConfig;
use crate::capture::domain::capture_backend::CaptureError;
use crate::detection::domain::frame_source::FrameSource;
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// Fixed set of camera streams, one per configured id.
///
/// Streams are started eagerly and live until [`close_all`](Self::close_all)
/// or drop. Asking for an id that was never configured is a programming
/// error and panics; use [`contains`](Self::contains) to validate input.
pub struct CameraManager {
    streams: BTreeMap<CameraId, CameraStream>,
}

impl CameraManager {
    /// Starts one stream per id, each configured from the process environment.
    pub fn new(camera_ids: &[CameraId]) -> Result<Self, CaptureError> {
        Self::with_config(camera_ids, |id| CaptureConfig::from_process_env(id))
    }

    /// Starts one stream per id with the config produced by `config_for`.
    pub fn with_config<F>(camera_ids: &[CameraId], config_for: F) -> Result<Self, CaptureError>
    where
        F: Fn(CameraId) -> Result<CaptureConfig, CaptureError>,
    {
        let mut streams = Vec::with_capacity(camera_ids.len());
        for &id in camera_ids {
            streams.push(CameraStream::start(id, config_for(id)?)?);
        }
        Ok(Self::with_streams(streams))
    }

    pub fn with_streams(streams: Vec<CameraStream>) -> Self {
        Self {
            streams: streams.into_iter().map(|s| (s.camera_id(), s)).collect(),
        }
    }

    pub fn contains(&self, camera_id: CameraId) -> bool {
        self.streams.contains_key(&camera_id)
    }

    pub fn camera_ids(&self) -> Vec<CameraId> {
        self.streams.keys().copied().collect()
    }

    /// # Panics
    ///
    /// Panics if `camera_id` is not configured.
    pub fn stream(&self, camera_id: CameraId) -> &CameraStream {
        match self.streams.get(&camera_id) {
            Some(stream) => stream,
            None => panic!("camera {camera_id} is not configured"),
        }
    }

    /// # Panics
    ///
    /// Panics if `camera_id` is not configured.
    pub fn get_frame(&self, camera_id: CameraId) -> Frame {
        self.stream(camera_id).get_frame()
    }

    pub fn status(&self) -> BTreeMap<CameraId, StreamStatus> {
        self.streams
            .iter()
            .map(|(&id, stream)| (id, stream.status()))
            .collect()
    }

    /// Closes every stream in id order.
    pub fn close_all(&self) {
        for stream in self.streams.values() {
            stream.close();
        }
    }
}

impl FrameSource for CameraManager {
    fn latest_frame(&self, camera_id: CameraId) -> Option<Frame> {
        self.streams.get(&camera_id).map(CameraStream::get_frame)
    }
}
