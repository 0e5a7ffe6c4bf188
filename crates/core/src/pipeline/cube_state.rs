use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cube::face_layout::FaceLayout;
use crate::detection::detection_pipeline::DetectionSet;

#[derive(Error, Debug)]
pub enum StateFileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cube state in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One capture of the whole cube.
///
/// `solver_input` is set only when the layout was complete and its centers
/// resolved; otherwise `solver_error` may carry the reason.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeState {
    /// Seconds since the Unix epoch; `None` until the first capture.
    pub captured_at: Option<f64>,
    pub faces: FaceLayout,
    pub complete: bool,
    pub solver_input: Option<String>,
    pub solver_error: Option<String>,
    pub detections: DetectionSet,
}

impl CubeState {
    pub fn is_captured(&self) -> bool {
        self.captured_at.is_some()
    }
}

/// `<config dir>/cubescan/cube_state.json`.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cubescan").join("cube_state.json"))
}

pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Loads a saved state; a missing file is the empty state.
pub fn load_state(path: &Path) -> Result<CubeState, StateFileError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CubeState::default()),
        Err(source) => {
            return Err(StateFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| StateFileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes any serializable value as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateFileError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StateFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| StateFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::sticker_detection::StickerDetection;
    use crate::shared::camera_id::CameraId;
    use crate::shared::cube::{ColorCode, Face};

    fn sample_state() -> CubeState {
        let detection = StickerDetection {
            id: "U4".into(),
            face: Face::U,
            index: 4,
            color: ColorCode::White,
            color_name: "white".into(),
            confidence: 0.91,
            label: "W91%".into(),
        };
        let mut faces = FaceLayout::empty();
        faces.set(Face::U, 4, ColorCode::White);
        CubeState {
            captured_at: Some(1_700_000_000.5),
            faces,
            complete: false,
            solver_input: None,
            solver_error: None,
            detections: DetectionSet::from([(CameraId::new(0), vec![detection])]),
        }
    }

    #[test]
    fn test_default_state_is_uncaptured() {
        let state = CubeState::default();
        assert!(!state.is_captured());
        assert!(!state.complete);
        assert!(state.detections.is_empty());
    }

    #[test]
    fn test_missing_file_loads_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("cube_state.json")).unwrap();
        assert_eq!(state, CubeState::default());
    }

    #[test]
    fn test_saved_state_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cube_state.json");
        let state = sample_state();

        save_json(&path, &state).unwrap();

        assert_eq!(load_state(&path).unwrap(), state);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(json["faces"]["U"][4], "W");
        assert_eq!(json["detections"]["0"][0]["label"], "W91%");
        assert!(json["solver_input"].is_null());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube_state.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load_state(&path), Err(StateFileError::Json { .. })));
    }
}
