use crate::capture::capture_config::{CaptureConfig, DeviceSpec};
use crate::shared::camera_id::CameraId;

/// Ordered, de-duplicated device paths to try for `camera`.
///
/// Priority: explicit path override, single-device override, the camera's
/// default node, per-camera fallbacks, then global probe indices. Negative
/// indices are dropped.
pub fn device_candidates(camera: CameraId, config: &CaptureConfig) -> Vec<String> {
    let mut specs: Vec<DeviceSpec> = Vec::new();
    if let Some(path) = &config.device_path {
        specs.push(DeviceSpec::Path(path.clone()));
    }
    if let Some(device) = &config.device {
        specs.push(device.clone());
    }
    specs.push(DeviceSpec::Path(camera.default_device_path()));
    specs.extend(config.fallback_indices.iter().copied().map(DeviceSpec::Index));
    specs.extend(config.probe_indices.iter().copied().map(DeviceSpec::Index));

    let mut candidates: Vec<String> = Vec::with_capacity(specs.len());
    for spec in specs {
        let Some(path) = spec_to_path(&spec) else {
            log::debug!("Camera {camera}: skipping invalid device candidate {spec:?}");
            continue;
        };
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}

fn spec_to_path(spec: &DeviceSpec) -> Option<String> {
    match spec {
        DeviceSpec::Index(index) if *index >= 0 => Some(format!("/dev/video{index}")),
        DeviceSpec::Index(_) => None,
        DeviceSpec::Path(path) if !path.trim().is_empty() => Some(path.trim().to_string()),
        DeviceSpec::Path(_) => None,
    }
}
