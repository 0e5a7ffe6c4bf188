use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::Serialize;

use crate::capture::capture_config::CaptureConfig;
use crate::capture::domain::capture_backend::{
    summarize_failures, CaptureBackend, CaptureError, CaptureHandle, SourceKind,
};
use crate::capture::infrastructure::backend_factory::create_backends;
use crate::capture::infrastructure::placeholder::placeholder_frame;
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

const INITIAL_STATUS: &str = "Initializing";
const WAITING_STATUS: &str = "Waiting for camera";
const NO_FRAME_STATUS: &str = "No frame yet";
/// Extra delay after a failed read, on top of the frame interval.
const FAILURE_BACKOFF: Duration = Duration::from_millis(100);
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);
const CLOSE_POLL: Duration = Duration::from_millis(10);

/// Snapshot of one stream's backend state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub camera_id: CameraId,
    pub source_kind: SourceKind,
    pub active_device: Option<String>,
    pub error: Option<String>,
}

/// Fields written by the acquisition thread and read by callers.
struct StreamState {
    latest: Option<Frame>,
    source: SourceKind,
    device: Option<String>,
    error: Option<String>,
    sequence: usize,
}

type SharedState = Arc<Mutex<StreamState>>;

fn lock(state: &SharedState) -> std::sync::MutexGuard<'_, StreamState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One capture device kept streaming on a background thread.
///
/// The thread opens a backend, reads frames at the configured cadence and
/// publishes the newest one into a single-slot cache. Read failures put the
/// stream into back-off: placeholders are published until the reconnect
/// cooldown allows another open attempt.
pub struct CameraStream {
    camera_id: CameraId,
    width: u32,
    height: u32,
    state: SharedState,
    stop: Arc<AtomicBool>,
    wake: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CameraStream {
    /// Starts a stream using the backends `config` asks for.
    pub fn start(camera_id: CameraId, config: CaptureConfig) -> Result<Self, CaptureError> {
        let backends = create_backends(&config);
        Self::with_backends(camera_id, config, backends)
    }

    /// Starts a stream over an explicit backend list, tried in order.
    pub fn with_backends(
        camera_id: CameraId,
        config: CaptureConfig,
        backends: Vec<Box<dyn CaptureBackend>>,
    ) -> Result<Self, CaptureError> {
        let state = Arc::new(Mutex::new(StreamState {
            latest: None,
            source: SourceKind::None,
            device: None,
            error: Some(INITIAL_STATUS.to_string()),
            sequence: 0,
        }));
        let stop = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = crossbeam_channel::bounded::<()>(0);

        let (width, height) = (config.width, config.height);
        let acquisition = Acquisition {
            camera_id,
            config,
            backends,
            active: None,
            next_reconnect_at: None,
            state: state.clone(),
            stop: stop.clone(),
            wake: wake_rx,
        };
        let worker = thread::Builder::new()
            .name(format!("camera-{camera_id}"))
            .spawn(move || acquisition.run())?;

        Ok(Self {
            camera_id,
            width,
            height,
            state,
            stop,
            wake: Mutex::new(Some(wake_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    /// Copy of the newest frame, or a placeholder before the first one.
    pub fn get_frame(&self) -> Frame {
        let latest = lock(&self.state).latest.clone();
        latest.unwrap_or_else(|| placeholder_frame(self.camera_id, NO_FRAME_STATUS, self.width, self.height))
    }

    pub fn status(&self) -> StreamStatus {
        let state = lock(&self.state);
        StreamStatus {
            camera_id: self.camera_id,
            source_kind: state.source,
            active_device: state.device.clone(),
            error: state.error.clone(),
        }
    }

    /// Stops the acquisition thread and releases the device.
    ///
    /// Waits up to 500 ms for the thread; a thread stuck in a device read is
    /// detached and releases the device once the read returns. Safe to call
    /// more than once.
    pub fn close(&self) {
        self.stop.store(true, Ordering::Relaxed);
        drop(self.wake.lock().unwrap_or_else(PoisonError::into_inner).take());

        let Some(worker) = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return;
        };
        let deadline = Instant::now() + CLOSE_TIMEOUT;
        while !worker.is_finished() && Instant::now() < deadline {
            thread::sleep(CLOSE_POLL);
        }
        if !worker.is_finished() {
            log::warn!(
                "Camera {}: capture thread did not stop within {:?}; detaching",
                self.camera_id,
                CLOSE_TIMEOUT
            );
            return;
        }
        if worker.join().is_err() {
            log::warn!("Camera {}: capture thread panicked", self.camera_id);
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Everything the acquisition thread owns, device handle included.
struct Acquisition {
    camera_id: CameraId,
    config: CaptureConfig,
    backends: Vec<Box<dyn CaptureBackend>>,
    active: Option<(SourceKind, Box<dyn CaptureHandle>)>,
    next_reconnect_at: Option<Instant>,
    state: SharedState,
    stop: Arc<AtomicBool>,
    wake: Receiver<()>,
}

impl Acquisition {
    fn run(mut self) {
        let interval = self.config.frame_interval();
        log::debug!("Camera {}: acquisition started ({interval:?} per frame)", self.camera_id);

        while !self.stop.load(Ordering::Relaxed) {
            match self.grab() {
                Some(frame) => self.publish(frame),
                None => {
                    let message = lock(&self.state)
                        .error
                        .clone()
                        .unwrap_or_else(|| WAITING_STATUS.to_string());
                    let placeholder =
                        placeholder_frame(self.camera_id, &message, self.config.width, self.config.height);
                    self.publish(placeholder);
                    if self.pause(FAILURE_BACKOFF) {
                        break;
                    }
                }
            }
            if self.pause(interval) {
                break;
            }
        }

        self.release();
        log::debug!("Camera {}: acquisition stopped", self.camera_id);
    }

    /// One read from the active handle, or an open attempt when there is none.
    fn grab(&mut self) -> Option<Frame> {
        let Some((kind, handle)) = self.active.as_mut() else {
            self.reconnect();
            return None;
        };

        let failure = match handle.read() {
            Ok(frame) if frame.is_valid() => return Some(frame),
            Ok(_) => format!("{kind} read returned an empty frame"),
            Err(e) => format!("{kind} read failed: {e}"),
        };
        log::warn!("Camera {}: {failure}", self.camera_id);
        lock(&self.state).error = Some(failure);
        self.reconnect();
        None
    }

    /// Reopens the device unless the cooldown since the last attempt is still
    /// running; in that case the current handle is kept.
    fn reconnect(&mut self) {
        let now = Instant::now();
        if self.next_reconnect_at.is_some_and(|at| now < at) {
            return;
        }
        self.next_reconnect_at = Some(now + self.config.reconnect_cooldown());
        self.release();

        if self.backends.is_empty() {
            lock(&self.state).error = Some(CaptureError::NoBackend(self.camera_id).to_string());
            return;
        }

        let mut failures = Vec::new();
        for backend in &mut self.backends {
            let kind = backend.kind();
            match backend.open(self.camera_id, &self.config) {
                Ok(handle) => {
                    log::info!(
                        "Camera {}: opened {} via {kind}",
                        self.camera_id,
                        handle.device()
                    );
                    {
                        let mut state = lock(&self.state);
                        state.source = kind;
                        state.device = Some(handle.device().to_string());
                        state.error = None;
                    }
                    self.active = Some((kind, handle));
                    self.next_reconnect_at = None;
                    return;
                }
                Err(e) => {
                    log::warn!("Camera {}: {kind} unavailable: {e}", self.camera_id);
                    failures.push(format!("{kind}: {e}"));
                }
            }
        }
        lock(&self.state).error = Some(summarize_failures(&failures));
    }

    /// Closes the active handle, if any. Close failures are only logged.
    fn release(&mut self) {
        if let Some((kind, mut handle)) = self.active.take() {
            if let Err(e) = handle.close() {
                log::warn!(
                    "Camera {}: closing {kind} device {} failed: {e}",
                    self.camera_id,
                    handle.device()
                );
            }
        }
        let mut state = lock(&self.state);
        state.source = SourceKind::None;
        state.device = None;
    }

    fn publish(&self, frame: Frame) {
        let mut state = lock(&self.state);
        state.sequence += 1;
        state.latest = Some(frame.with_sequence(state.sequence));
    }

    /// Sleeps for `duration`; returns true as soon as the stream is stopped.
    fn pause(&self, duration: Duration) -> bool {
        match self.wake.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.stop.load(Ordering::Relaxed),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
