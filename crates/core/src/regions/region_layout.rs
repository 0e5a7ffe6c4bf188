use serde_json::{Map, Value};

use crate::detection::domain::sticker_region::{RegionConfig, StickerRegion};
use crate::shared::camera_id::CameraId;
use crate::shared::constants::{camera_faces, REGIONS_PER_CAMERA, STICKERS_PER_FACE};
use crate::shared::cube::Face;

const FACE_ORIGINS_X: [f64; 3] = [0.05, 0.37, 0.69];
const FACE_ORIGIN_Y: f64 = 0.17;
const FACE_BLOCK: f64 = 0.26;
const BOX_FILL: f64 = 0.82;

const MAX_ORIGIN: f64 = 0.98;
const MIN_EXTENT: f64 = 0.02;
const MAX_EXTENT: f64 = 0.60;
const MAX_INDEX: i64 = (STICKERS_PER_FACE - 1) as i64;

// Fallbacks for fields missing from a stored region.
const DEFAULT_ORIGIN: f64 = 0.10;
const DEFAULT_EXTENT: f64 = 0.08;

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Three 3×3 grids side by side, one per face the camera sees.
///
/// Cameras without an assigned face triple get no regions.
pub fn default_regions(camera: CameraId) -> Vec<StickerRegion> {
    let Some(faces) = camera_faces(camera) else {
        return Vec::new();
    };
    let cell = FACE_BLOCK / 3.0;
    let size = cell * BOX_FILL;
    let inset = (cell - size) / 2.0;

    let mut regions = Vec::with_capacity(REGIONS_PER_CAMERA);
    for (face, origin_x) in faces.iter().zip(FACE_ORIGINS_X) {
        for index in 0..STICKERS_PER_FACE {
            let (row, col) = ((index / 3) as f64, (index % 3) as f64);
            regions.push(StickerRegion {
                id: format!("{face}{index}"),
                face: *face,
                index: index as u8,
                x: round5(origin_x + col * cell + inset),
                y: round5(FACE_ORIGIN_Y + row * cell + inset),
                w: round5(size),
                h: round5(size),
            });
        }
    }
    regions
}

pub fn default_config(cameras: &[CameraId]) -> RegionConfig {
    cameras.iter().map(|&id| (id, default_regions(id))).collect()
}

/// Accepts numbers and numeric strings.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numbers are truncated; strings must spell a whole integer.
fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerces a loosely-typed stored region into a valid one.
///
/// Unknown faces become `U`, the index is clamped to `0..=8`, the window is
/// clamped and then pushed back inside the unit square.
pub fn normalize_region(raw: &Map<String, Value>) -> StickerRegion {
    let face = raw
        .get("face")
        .and_then(Value::as_str)
        .and_then(Face::from_letter)
        .unwrap_or(Face::U);
    let index = integer(raw.get("index"))
        .map(|i| i.clamp(0, MAX_INDEX))
        .unwrap_or(0) as u8;

    let w = number(raw.get("w")).unwrap_or(DEFAULT_EXTENT).clamp(MIN_EXTENT, MAX_EXTENT);
    let h = number(raw.get("h")).unwrap_or(DEFAULT_EXTENT).clamp(MIN_EXTENT, MAX_EXTENT);
    let mut x = number(raw.get("x")).unwrap_or(DEFAULT_ORIGIN).clamp(0.0, MAX_ORIGIN);
    let mut y = number(raw.get("y")).unwrap_or(DEFAULT_ORIGIN).clamp(0.0, MAX_ORIGIN);
    if x + w > 1.0 {
        x = 1.0 - w;
    }
    if y + h > 1.0 {
        y = 1.0 - h;
    }

    let id = match raw.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => format!("{face}{index}"),
        Some(other) => other.to_string(),
    };

    StickerRegion {
        id,
        face,
        index,
        x: round5(x),
        y: round5(y),
        w: round5(w),
        h: round5(h),
    }
}

/// Normalizes one camera's region list; anything but exactly 27 usable
/// entries falls back to the camera's default layout.
pub fn validate_camera(camera: CameraId, candidate: Option<&Value>) -> Vec<StickerRegion> {
    let Some(Value::Array(items)) = candidate else {
        return default_regions(camera);
    };
    let normalized: Vec<StickerRegion> = items
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_region)
        .collect();
    if normalized.len() != REGIONS_PER_CAMERA {
        log::warn!(
            "Camera {camera}: expected {REGIONS_PER_CAMERA} regions, got {}; using defaults",
            normalized.len()
        );
        return default_regions(camera);
    }
    normalized
}

/// Validates a `{"<camera id>": [...]}` document for every configured camera.
pub fn validate_config(candidate: &Value, cameras: &[CameraId]) -> RegionConfig {
    let Value::Object(by_camera) = candidate else {
        return default_config(cameras);
    };
    cameras
        .iter()
        .map(|&id| (id, validate_camera(id, by_camera.get(&id.to_string()))))
        .collect()
}
