use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single frame for inspection.
pub trait SnapshotWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
