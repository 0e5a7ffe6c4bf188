use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::capture::domain::snapshot_writer::SnapshotWriter;
use crate::shared::constants::SNAPSHOT_JPEG_QUALITY;
use crate::shared::frame::Frame;

/// Encodes an RGB frame as a baseline JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Writes frames as JPEG files using the `image` crate.
pub struct JpegSnapshotWriter {
    quality: u8,
}

impl JpegSnapshotWriter {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl Default for JpegSnapshotWriter {
    fn default() -> Self {
        Self::new(SNAPSHOT_JPEG_QUALITY)
    }
}

impl SnapshotWriter for JpegSnapshotWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !frame.is_valid() {
            return Err("Cannot encode an empty frame".into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, encode_jpeg(frame, self.quality)?)?;
        Ok(())
    }
}
