use std::str::FromStr;
use std::time::Duration;

use crate::capture::domain::capture_backend::CaptureError;
use crate::shared::camera_id::CameraId;
use crate::shared::constants::{
    DEFAULT_FPS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_RECONNECT_SECS,
    MIN_RECONNECT_MILLIS,
};

const DEFAULT_WARMUP_ATTEMPTS: u32 = 5;
const DEFAULT_WARMUP_DELAY: Duration = Duration::from_millis(60);

/// Which backends a stream may try.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendPreference {
    #[default]
    Auto,
    Libcamera,
    V4l2,
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "libcamera" | "picamera2" => Ok(Self::Libcamera),
            "v4l2" | "opencv" | "usb" => Ok(Self::V4l2),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// A device given either as a numeric index or a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceSpec {
    Index(i64),
    Path(String),
}

impl DeviceSpec {
    /// Parses `"2"` as an index and anything else as a path.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Path(trimmed.to_string()),
        })
    }
}

/// Per-stream capture settings.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub reconnect_interval: Duration,
    pub backend: BackendPreference,
    /// Try the hardware camera stack before the generic backend.
    pub hardware_primary: bool,
    pub device_path: Option<String>,
    pub device: Option<DeviceSpec>,
    pub fallback_indices: Vec<i64>,
    pub probe_indices: Vec<i64>,
    pub warmup_attempts: u32,
    pub warmup_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            fps: DEFAULT_FPS,
            reconnect_interval: Duration::from_secs_f64(DEFAULT_RECONNECT_SECS),
            backend: BackendPreference::Auto,
            hardware_primary: true,
            device_path: None,
            device: None,
            fallback_indices: Vec::new(),
            probe_indices: Vec::new(),
            warmup_attempts: DEFAULT_WARMUP_ATTEMPTS,
            warmup_delay: DEFAULT_WARMUP_DELAY,
        }
    }
}

impl CaptureConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_process_env(camera: CameraId) -> Result<Self, CaptureError> {
        Self::from_env(camera, |key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Per-camera keys (`CAMERA_<id>_...`) take precedence over global ones.
    /// Blank values count as unset.
    pub fn from_env<F>(camera: CameraId, lookup: F) -> Result<Self, CaptureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let per_camera = |suffix: &str| format!("CAMERA_{}_{suffix}", camera.value());

        let mut config = Self::default();

        if let Some(value) = get(&per_camera("BACKEND")).or_else(|| get("CAMERA_BACKEND")) {
            config.backend = value
                .parse()
                .map_err(|_| invalid("CAMERA_BACKEND", &value))?;
        }
        if let Some(value) = get("CAMERA_RECONNECT_INTERVAL") {
            let secs: f64 = parse_number("CAMERA_RECONNECT_INTERVAL", &value)?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid("CAMERA_RECONNECT_INTERVAL", &value));
            }
            config.reconnect_interval = Duration::from_secs_f64(secs);
        }
        if let Some(value) = get("CAMERA_WIDTH") {
            config.width = parse_number("CAMERA_WIDTH", &value)?;
        }
        if let Some(value) = get("CAMERA_HEIGHT") {
            config.height = parse_number("CAMERA_HEIGHT", &value)?;
        }
        if let Some(value) = get("CAMERA_FPS") {
            config.fps = parse_number("CAMERA_FPS", &value)?;
        }
        config.device_path = get(&per_camera("DEVICE_PATH")).map(|v| v.trim().to_string());
        config.device = get(&per_camera("DEVICE")).and_then(|v| DeviceSpec::parse(&v));
        if let Some(value) = get(&per_camera("FALLBACK_INDICES")) {
            config.fallback_indices = parse_indices(&per_camera("FALLBACK_INDICES"), &value)?;
        }
        if let Some(value) = get("CAMERA_PROBE_INDICES") {
            config.probe_indices = parse_indices("CAMERA_PROBE_INDICES", &value)?;
        }

        Ok(config)
    }

    /// Minimum spacing between open attempts.
    pub fn reconnect_cooldown(&self) -> Duration {
        self.reconnect_interval
            .max(Duration::from_millis(MIN_RECONNECT_MILLIS))
    }

    /// Target delay between frame reads.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

fn invalid(key: &str, value: &str) -> CaptureError {
    CaptureError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, CaptureError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_indices(key: &str, value: &str) -> Result<Vec<i64>, CaptureError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_number(key, part))
        .collect()
}
