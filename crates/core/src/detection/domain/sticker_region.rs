use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::camera_id::CameraId;
use crate::shared::cube::Face;

/// Per-camera ordered region lists.
pub type RegionConfig = BTreeMap<CameraId, Vec<StickerRegion>>;

/// A sticker's sampling window in normalized image coordinates.
///
/// `(x, y)` is the top-left corner; all four values live in `[0, 1]`.
/// `(face, index)` names the sticker slot the window feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StickerRegion {
    pub id: String,
    pub face: Face,
    pub index: u8,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Half-open pixel rectangle `[x1, x2) × [y1, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersection with a `width × height` frame.
    pub fn clipped_to(&self, width: u32, height: u32) -> PixelRect {
        PixelRect {
            x1: self.x1.min(width),
            y1: self.y1.min(height),
            x2: self.x2.min(width),
            y2: self.y2.min(height),
        }
    }
}
