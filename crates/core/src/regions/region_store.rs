use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;

use crate::detection::domain::sticker_region::{RegionConfig, StickerRegion};
use crate::regions::region_layout::{default_config, default_regions, validate_camera, validate_config};
use crate::shared::camera_id::CameraId;

#[derive(Error, Debug)]
pub enum RegionConfigError {
    #[error("camera {0} is not configured")]
    UnknownCamera(CameraId),
    #[error("failed to write regions to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode regions: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// `<config dir>/cubescan/regions.json`.
pub fn default_region_path() -> Result<PathBuf, RegionConfigError> {
    dirs::config_dir()
        .map(|d| d.join("cubescan").join("regions.json"))
        .ok_or(RegionConfigError::NoConfigDir)
}

/// Reads a region document; a missing or unparsable file yields `None`.
fn read_document(path: &Path) -> Option<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Could not read {}: {e}; using default regions", path.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt region file {}: {e}", path.display());
            None
        }
    }
}

/// Current region configuration behind a lock, optionally backed by a file.
///
/// Readers take an immutable [`snapshot`](Self::snapshot); every mutation
/// swaps in a new snapshot and, when file-backed, rewrites the file.
pub struct RegionStore {
    cameras: Vec<CameraId>,
    path: Option<PathBuf>,
    current: Mutex<Arc<RegionConfig>>,
}

impl RegionStore {
    /// Default layout for `cameras`, not persisted.
    pub fn in_memory(cameras: &[CameraId]) -> Self {
        Self {
            cameras: cameras.to_vec(),
            path: None,
            current: Mutex::new(Arc::new(default_config(cameras))),
        }
    }

    /// Loads and validates `path`, then writes the normalized result back.
    pub fn open(path: impl Into<PathBuf>, cameras: &[CameraId]) -> Result<Self, RegionConfigError> {
        let path = path.into();
        let config = match read_document(&path) {
            Some(doc) => validate_config(&doc, cameras),
            None => default_config(cameras),
        };
        let store = Self {
            cameras: cameras.to_vec(),
            path: Some(path),
            current: Mutex::new(Arc::new(config)),
        };
        store.persist(&store.snapshot())?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> Arc<RegionConfig> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces one camera's regions with the validated `candidate` list.
    pub fn set_camera(
        &self,
        camera: CameraId,
        candidate: &Value,
    ) -> Result<Vec<StickerRegion>, RegionConfigError> {
        self.ensure_configured(camera)?;
        let regions = validate_camera(camera, Some(candidate));
        self.update(|config| {
            config.insert(camera, regions.clone());
        })?;
        Ok(regions)
    }

    /// Replaces the cameras present in a `{"<id>": [...]}` document; others
    /// keep their regions.
    pub fn set_many(&self, candidate: &Value) -> Result<Arc<RegionConfig>, RegionConfigError> {
        let Value::Object(by_camera) = candidate else {
            return Ok(self.snapshot());
        };
        let cameras = self.cameras.clone();
        self.update(|config| {
            for camera in cameras {
                if let Some(list) = by_camera.get(&camera.to_string()) {
                    config.insert(camera, validate_camera(camera, Some(list)));
                }
            }
        })
    }

    /// Restores defaults for one camera, or for all when `camera` is `None`.
    pub fn reset(&self, camera: Option<CameraId>) -> Result<Arc<RegionConfig>, RegionConfigError> {
        if let Some(camera) = camera {
            self.ensure_configured(camera)?;
        }
        let cameras = self.cameras.clone();
        self.update(|config| match camera {
            Some(camera) => {
                config.insert(camera, default_regions(camera));
            }
            None => *config = default_config(&cameras),
        })
    }

    fn ensure_configured(&self, camera: CameraId) -> Result<(), RegionConfigError> {
        if self.cameras.contains(&camera) {
            Ok(())
        } else {
            Err(RegionConfigError::UnknownCamera(camera))
        }
    }

    /// Applies `change` to a copy, persists it, then publishes it.
    fn update<F>(&self, change: F) -> Result<Arc<RegionConfig>, RegionConfigError>
    where
        F: FnOnce(&mut RegionConfig),
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegionConfig::clone(&current);
        change(&mut next);
        let next = Arc::new(next);
        self.persist(&next)?;
        *current = next.clone();
        Ok(next)
    }

    fn persist(&self, config: &RegionConfig) -> Result<(), RegionConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(config)?;
        let write_err = |source| RegionConfigError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, json).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CAMERAS: [CameraId; 2] = [CameraId::new(0), CameraId::new(1)];

    fn camera_doc(camera: CameraId) -> Value {
        serde_json::to_value(default_regions(camera)).unwrap()
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("regions.json");

        let store = RegionStore::open(&path, &CAMERAS).unwrap();

        assert_eq!(*store.snapshot(), default_config(&CAMERAS));
        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["1"].as_array().unwrap().len(), 27);
        assert_eq!(saved["0"][0]["id"], "U0");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        fs::write(&path, "{ not json").unwrap();

        let store = RegionStore::open(&path, &CAMERAS).unwrap();
        assert_eq!(*store.snapshot(), default_config(&CAMERAS));
    }

    #[test]
    fn test_saved_edits_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        let store = RegionStore::open(&path, &CAMERAS).unwrap();

        let mut doc = camera_doc(CameraId::new(1));
        doc[3]["x"] = json!(0.42);
        store.set_camera(CameraId::new(1), &doc).unwrap();

        let reloaded = RegionStore::open(&path, &CAMERAS).unwrap();
        assert_eq!(reloaded.snapshot()[&CameraId::new(1)][3].x, 0.42);
        assert_eq!(*reloaded.snapshot(), *store.snapshot());
    }

    #[test]
    fn test_set_camera_rejects_unknown_camera() {
        let store = RegionStore::in_memory(&CAMERAS);
        let err = store.set_camera(CameraId::new(4), &json!([])).unwrap_err();
        assert!(matches!(err, RegionConfigError::UnknownCamera(id) if id == CameraId::new(4)));
    }

    #[test]
    fn test_invalid_list_resets_that_camera() {
        let store = RegionStore::in_memory(&CAMERAS);
        let mut doc = camera_doc(CameraId::new(0));
        doc[0]["y"] = json!(0.5);
        store.set_camera(CameraId::new(0), &doc).unwrap();

        let regions = store.set_camera(CameraId::new(0), &json!([{"face": "U"}])).unwrap();
        assert_eq!(regions, default_regions(CameraId::new(0)));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let store = RegionStore::in_memory(&CAMERAS);
        let before = store.snapshot();

        let mut doc = camera_doc(CameraId::new(0));
        doc[0]["w"] = json!(0.3);
        store.set_camera(CameraId::new(0), &doc).unwrap();

        assert_eq!(before[&CameraId::new(0)][0].w, default_regions(CameraId::new(0))[0].w);
        assert_eq!(store.snapshot()[&CameraId::new(0)][0].w, 0.3);
    }

    #[test]
    fn test_set_many_only_touches_listed_cameras() {
        let store = RegionStore::in_memory(&CAMERAS);
        let mut doc = camera_doc(CameraId::new(1));
        doc[0]["h"] = json!(0.25);

        let config = store.set_many(&json!({"1": doc, "7": []})).unwrap();

        assert_eq!(config[&CameraId::new(0)], default_regions(CameraId::new(0)));
        assert_eq!(config[&CameraId::new(1)][0].h, 0.25);
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_reset_one_and_all() {
        let store = RegionStore::in_memory(&CAMERAS);
        for camera in CAMERAS {
            let mut doc = camera_doc(camera);
            doc[0]["x"] = json!(0.9);
            store.set_camera(camera, &doc).unwrap();
        }

        let config = store.reset(Some(CameraId::new(0))).unwrap();
        assert_eq!(config[&CameraId::new(0)], default_regions(CameraId::new(0)));
        assert_ne!(config[&CameraId::new(1)], default_regions(CameraId::new(1)));

        let config = store.reset(None).unwrap();
        assert_eq!(*config, default_config(&CAMERAS));
    }

    #[test]
    fn test_default_path_ends_with_app_file() {
        if let Ok(path) = default_region_path() {
            assert!(path.ends_with("cubescan/regions.json"));
        }
    }
}
