use std::path::Path;
use std::sync::OnceLock;
use std::thread;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;

use crate::capture::capture_config::CaptureConfig;
use crate::capture::domain::capture_backend::{
    summarize_failures, CaptureBackend, CaptureError, CaptureHandle, SourceKind,
};
use crate::capture::infrastructure::device_candidates::device_candidates;
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// How a device node is handed to libavformat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transport {
    /// The `video4linux2` input device.
    V4l2Demuxer,
    /// Let libavformat probe the format.
    Probe,
}

impl Transport {
    const ORDER: [Transport; 2] = [Transport::V4l2Demuxer, Transport::Probe];

    fn name(self) -> &'static str {
        match self {
            Transport::V4l2Demuxer => "v4l2",
            Transport::Probe => "probe",
        }
    }
}

/// Requested pixel format, most bandwidth-friendly first.
const CAPTURE_PROFILES: [Option<&str>; 3] = [Some("mjpeg"), Some("yuyv422"), None];

static FFMPEG_INIT: OnceLock<Result<(), String>> = OnceLock::new();

fn ensure_initialized() -> Result<(), CaptureError> {
    FFMPEG_INIT
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|e| e.to_string())?;
            ffmpeg_next::device::register_all();
            Ok(())
        })
        .clone()
        .map_err(|reason| CaptureError::Unavailable {
            backend: SourceKind::V4l2,
            reason,
        })
}

/// Generic V4L-style capture through ffmpeg-next's libavdevice bindings.
///
/// Walks the device candidate list and, per device, every transport and
/// capture profile until a handle survives the warm-up read.
#[derive(Default)]
pub struct FfmpegCaptureBackend;

impl FfmpegCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for FfmpegCaptureBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::V4l2
    }

    fn open(
        &mut self,
        camera: CameraId,
        config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        ensure_initialized()?;

        let mut failures = Vec::new();
        for device in device_candidates(camera, config) {
            match open_device(&device, config) {
                Ok(handle) => {
                    log::info!("Camera {camera}: streaming from {device}");
                    return Ok(Box::new(handle));
                }
                Err(reason) => {
                    log::debug!("Camera {camera}: {device} unusable: {reason}");
                    failures.push(format!("{device}: {reason}"));
                }
            }
        }

        Err(CaptureError::Open {
            camera,
            reason: summarize_failures(&failures),
        })
    }
}

/// Tries every transport and profile on one device; returns the last reason
/// on failure.
fn open_device(device: &str, config: &CaptureConfig) -> Result<FfmpegCaptureHandle, String> {
    if device.starts_with('/') && !Path::new(device).exists() {
        return Err("not found".to_string());
    }

    let mut last_reason = String::from("no transport available");
    for transport in Transport::ORDER {
        for profile in CAPTURE_PROFILES {
            match open_profile(device, transport, profile, config) {
                Ok(handle) => return Ok(handle),
                Err(e) => {
                    last_reason = format!(
                        "{}/{}: {e}",
                        transport.name(),
                        profile.unwrap_or("default")
                    );
                }
            }
        }
    }
    Err(last_reason)
}

fn open_profile(
    device: &str,
    transport: Transport,
    profile: Option<&str>,
    config: &CaptureConfig,
) -> Result<FfmpegCaptureHandle, CaptureError> {
    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &format!("{}x{}", config.width, config.height));
    options.set("framerate", &config.fps.max(1).to_string());
    options.set("fflags", "nobuffer");
    if let Some(pixel_format) = profile {
        options.set("input_format", pixel_format);
    }

    let input = match transport {
        Transport::V4l2Demuxer => {
            let format = ffmpeg_next::device::input::video()
                .find(|f| f.name().contains("v4l2"))
                .ok_or_else(|| CaptureError::Read("v4l2 demuxer not compiled in".into()))?;
            ffmpeg_next::format::open_with(&device, &format, options)
                .map_err(read_error)?
                .input()
        }
        Transport::Probe => {
            ffmpeg_next::format::input_with_dictionary(&device, options).map_err(read_error)?
        }
    };

    let mut handle = FfmpegCaptureHandle::new(device.to_string(), input)?;
    warm_up(&mut handle, config)?;
    Ok(handle)
}

/// Reads until one frame decodes; the handle is dropped by the caller on
/// failure.
fn warm_up(handle: &mut FfmpegCaptureHandle, config: &CaptureConfig) -> Result<(), CaptureError> {
    let attempts = config.warmup_attempts.max(1);
    let mut last_error = CaptureError::Read("warm-up produced no frame".into());
    for attempt in 0..attempts {
        match handle.read() {
            Ok(_) => return Ok(()),
            Err(e) => last_error = e,
        }
        if attempt + 1 < attempts {
            thread::sleep(config.warmup_delay);
        }
    }
    Err(last_error)
}

fn read_error(e: ffmpeg_next::Error) -> CaptureError {
    CaptureError::Read(e.to_string())
}

struct Decoding {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
    scaler: Option<Scaler>,
}

/// RGB24 converter keyed on the source geometry it was built for.
struct Scaler {
    context: scaling::Context,
    format: Pixel,
    width: u32,
    height: u32,
}

/// An open ffmpeg input plus its decoder.
pub struct FfmpegCaptureHandle {
    device: String,
    decoding: Option<Decoding>,
}

// Safety: the handle is owned by a single acquisition thread; the raw
// pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegCaptureHandle {}

impl FfmpegCaptureHandle {
    fn new(device: String, input: ffmpeg_next::format::context::Input) -> Result<Self, CaptureError> {
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CaptureError::Read("no video stream".into()))?;
        let stream_index = stream.index();
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(read_error)?
            .decoder()
            .video()
            .map_err(read_error)?;

        Ok(Self {
            device,
            decoding: Some(Decoding {
                input,
                decoder,
                stream_index,
                scaler: None,
            }),
        })
    }
}

impl CaptureHandle for FfmpegCaptureHandle {
    fn device(&self) -> &str {
        &self.device
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        let decoding = self
            .decoding
            .as_mut()
            .ok_or_else(|| CaptureError::Read("device closed".into()))?;

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        for (stream, packet) in decoding.input.packets() {
            if stream.index() != decoding.stream_index {
                continue;
            }
            if decoding.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if decoding.decoder.receive_frame(&mut decoded).is_ok() {
                return to_rgb_frame(&mut decoding.scaler, &decoded);
            }
        }
        Err(CaptureError::Read(format!("{}: stream ended", self.device)))
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.decoding = None;
        Ok(())
    }
}

fn to_rgb_frame(
    scaler: &mut Option<Scaler>,
    decoded: &ffmpeg_next::util::frame::video::Video,
) -> Result<Frame, CaptureError> {
    let (format, width, height) = (decoded.format(), decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(CaptureError::Read("decoded an empty frame".into()));
    }

    let stale = scaler
        .as_ref()
        .map_or(true, |s| (s.format, s.width, s.height) != (format, width, height));
    if stale {
        let context = scaling::Context::get(
            format,
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(read_error)?;
        *scaler = Some(Scaler {
            context,
            format,
            width,
            height,
        });
    }

    let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
    if let Some(s) = scaler.as_mut() {
        s.context.run(decoded, &mut rgb).map_err(read_error)?;
    }
    Ok(Frame::new(extract_rgb_pixels(&rgb, width, height), width, height, 0))
}

/// Copies RGB rows into a tightly packed buffer, dropping stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
