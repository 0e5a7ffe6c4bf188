//! Raspberry Pi camera stack via libcamera.
//!
//! libcamera objects borrow their `CameraManager` and are not `Send`, so a
//! dedicated thread creates, drives and drops all of them. The handle only
//! holds channels and a stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use libcamera::camera::CameraConfigurationStatus;
use libcamera::camera_manager::CameraManager;
use libcamera::framebuffer_allocator::{FrameBuffer, FrameBufferAllocator};
use libcamera::framebuffer_map::MemoryMappedFrameBuffer;
use libcamera::geometry::Size;
use libcamera::pixel_format::PixelFormat;
use libcamera::request::ReuseFlag;
use libcamera::stream::StreamRole;

use crate::capture::capture_config::CaptureConfig;
use crate::capture::domain::capture_backend::{
    CaptureBackend, CaptureError, CaptureHandle, SourceKind,
};
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

/// DRM `BGR888`: packed 24-bit with bytes in R, G, B order in memory.
const PIXEL_FOURCC: [u8; 4] = *b"BG24";
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(3);
const READ_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_POLL: Duration = Duration::from_millis(200);

#[derive(Default)]
pub struct LibcameraCaptureBackend;

impl LibcameraCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for LibcameraCaptureBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Libcamera
    }

    fn open(
        &mut self,
        camera: CameraId,
        config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let (init_tx, init_rx) = std::sync::mpsc::sync_channel::<Result<String, String>>(1);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = stop.clone();
        let index = camera.value() as usize;
        let size = (config.width, config.height);
        let thread = thread::Builder::new()
            .name(format!("libcamera-{camera}"))
            .spawn(move || {
                if let Err(reason) = run_capture(index, size, &init_tx, &frame_tx, &thread_stop) {
                    log::warn!("libcamera capture for camera {index} stopped: {reason}");
                }
            })?;

        let unavailable = |reason: String| CaptureError::Unavailable {
            backend: SourceKind::Libcamera,
            reason,
        };
        let device = match init_rx.recv() {
            Ok(Ok(device)) => device,
            Ok(Err(reason)) => {
                let _ = thread.join();
                return Err(unavailable(reason));
            }
            Err(_) => return Err(unavailable("capture thread exited during setup".into())),
        };

        let mut handle = LibcameraCaptureHandle {
            device,
            frames: frame_rx,
            stop,
            thread: Some(thread),
            read_timeout: FIRST_FRAME_TIMEOUT,
        };
        if let Err(e) = handle.read() {
            let _ = handle.close();
            return Err(e);
        }
        handle.read_timeout = READ_TIMEOUT;
        log::info!("Camera {camera}: streaming from libcamera {}", handle.device);
        Ok(Box::new(handle))
    }
}

/// Owns every libcamera object for one camera until `stop` is set.
///
/// Setup failures go to `init_tx`; the returned error covers failures after
/// streaming started.
fn run_capture(
    index: usize,
    (width, height): (u32, u32),
    init_tx: &std::sync::mpsc::SyncSender<Result<String, String>>,
    frame_tx: &Sender<Frame>,
    stop: &AtomicBool,
) -> Result<(), String> {
    let setup_failed = |reason: String| {
        let _ = init_tx.send(Err(reason));
        Ok(())
    };

    let manager = match CameraManager::new() {
        Ok(manager) => manager,
        Err(e) => return setup_failed(format!("CameraManager::new: {e}")),
    };
    let cameras = manager.cameras();
    let Some(cam) = cameras.get(index) else {
        return setup_failed(format!("no libcamera camera at index {index}"));
    };
    let device = cam.id().to_string();
    let mut active = match cam.acquire() {
        Ok(active) => active,
        Err(e) => return setup_failed(format!("acquire {device}: {e}")),
    };

    let Some(mut cfgs) = cam.generate_configuration(&[StreamRole::VideoRecording]) else {
        return setup_failed("no configuration for VideoRecording".into());
    };
    if let Some(mut stream_cfg) = cfgs.get_mut(0) {
        stream_cfg.set_pixel_format(PixelFormat::new(u32::from_le_bytes(PIXEL_FOURCC), 0));
        stream_cfg.set_size(Size { width, height });
    }
    if let CameraConfigurationStatus::Invalid = cfgs.validate() {
        return setup_failed(format!("configuration rejected for {device}"));
    }
    if let Err(e) = active.configure(&mut cfgs) {
        return setup_failed(format!("configure {device}: {e}"));
    }

    let Some(stream_cfg) = cfgs.get(0) else {
        return setup_failed("configuration has no stream".into());
    };
    if stream_cfg.get_pixel_format().fourcc() != u32::from_le_bytes(PIXEL_FOURCC) {
        return setup_failed(format!(
            "{device} cannot deliver BGR888 (got {:?})",
            stream_cfg.get_pixel_format()
        ));
    }
    let size = stream_cfg.get_size();
    let stride = stream_cfg.get_stride() as usize;
    let Some(stream) = stream_cfg.stream() else {
        return setup_failed("configured stream missing".into());
    };

    let mut allocator = FrameBufferAllocator::new(&cam);
    let buffers = match allocator.alloc(&stream) {
        Ok(buffers) => buffers,
        Err(e) => return setup_failed(format!("buffer allocation: {e}")),
    };
    let mut requests = Vec::with_capacity(buffers.len());
    for buffer in buffers {
        let mapped = match MemoryMappedFrameBuffer::new(buffer) {
            Ok(mapped) => mapped,
            Err(e) => return setup_failed(format!("buffer mapping: {e:?}")),
        };
        let Some(mut request) = active.create_request(None) else {
            return setup_failed("request creation failed".into());
        };
        if let Err(e) = request.add_buffer(&stream, mapped) {
            return setup_failed(format!("attach buffer: {e}"));
        }
        requests.push(request);
    }

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    active.on_request_completed(move |request| {
        let _ = done_tx.send(request);
    });
    if let Err(e) = active.start(None) {
        return setup_failed(format!("start {device}: {e}"));
    }
    for request in requests {
        if let Err(e) = active.queue_request(request) {
            let _ = active.stop();
            return setup_failed(format!("queue request: {e}"));
        }
    }
    let _ = init_tx.send(Ok(device.clone()));

    let mut result = Ok(());
    while !stop.load(Ordering::Relaxed) {
        let mut request = match done_rx.recv_timeout(REQUEST_POLL) {
            Ok(request) => request,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                result = Err("request channel disconnected".to_string());
                break;
            }
        };

        let frame = request
            .buffer::<MemoryMappedFrameBuffer<FrameBuffer>>(&stream)
            .and_then(|buffer| buffer.data().first().map(|plane| pack_rows(plane, stride, size.width, size.height)));
        if let Some(frame) = frame {
            match frame_tx.try_send(frame) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }
        }

        request.reuse(ReuseFlag::REUSE_BUFFERS);
        if let Err(e) = active.queue_request(request) {
            result = Err(format!("re-queue request: {e}"));
            break;
        }
    }

    if let Err(e) = active.stop() {
        log::warn!("Stopping libcamera {device} failed: {e}");
    }
    while done_rx.try_recv().is_ok() {}
    result
}

/// Strips row padding from a packed 24-bit plane.
fn pack_rows(plane: &[u8], stride: usize, width: u32, height: u32) -> Frame {
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        match plane.get(start..start + row_bytes) {
            Some(bytes) => pixels.extend_from_slice(bytes),
            None => pixels.resize(pixels.len() + row_bytes, 0),
        }
    }
    Frame::new(pixels, width, height, 0)
}

pub struct LibcameraCaptureHandle {
    device: String,
    frames: Receiver<Frame>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    read_timeout: Duration,
}

impl CaptureHandle for LibcameraCaptureHandle {
    fn device(&self) -> &str {
        &self.device
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        match self.frames.recv_timeout(self.read_timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Read(format!(
                "libcamera {}: no frame within {:?}",
                self.device, self.read_timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::Read(format!(
                "libcamera {}: capture thread stopped",
                self.device
            ))),
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| CaptureError::Close(format!("libcamera {} thread panicked", self.device))),
            None => Ok(()),
        }
    }
}

impl Drop for LibcameraCaptureHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
