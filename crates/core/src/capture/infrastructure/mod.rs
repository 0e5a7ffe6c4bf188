pub mod backend_factory;
pub mod device_candidates;
pub mod ffmpeg_capture;
pub mod glyphs;
pub mod jpeg_snapshot_writer;
#[cfg(feature = "libcamera")]
pub mod libcamera_capture;
pub mod placeholder;
