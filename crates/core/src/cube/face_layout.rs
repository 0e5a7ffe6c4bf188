use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detection::detection_pipeline::DetectionSet;
use crate::shared::constants::STICKERS_PER_FACE;
use crate::shared::cube::{ColorCode, Face};

/// Sticker colors per face, row-major, index 4 is the center.
///
/// A layout built by [`assemble`] always has all six faces with nine
/// entries each; layouts that arrive from elsewhere (e.g. a saved state
/// file) are checked structurally by the orientation resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLayout {
    faces: BTreeMap<Face, Vec<ColorCode>>,
}

impl FaceLayout {
    /// All six faces, every slot unknown.
    pub fn empty() -> Self {
        Self {
            faces: Face::ORDER
                .iter()
                .map(|&face| (face, vec![ColorCode::Unknown; STICKERS_PER_FACE]))
                .collect(),
        }
    }

    pub fn from_faces(faces: BTreeMap<Face, Vec<ColorCode>>) -> Self {
        Self { faces }
    }

    pub fn face(&self, face: Face) -> Option<&[ColorCode]> {
        self.faces.get(&face).map(Vec::as_slice)
    }

    pub fn faces(&self) -> &BTreeMap<Face, Vec<ColorCode>> {
        &self.faces
    }

    /// Writes one slot. Out-of-range indices are ignored.
    pub fn set(&mut self, face: Face, index: usize, color: ColorCode) {
        if let Some(slot) = self.faces.get_mut(&face).and_then(|stickers| stickers.get_mut(index)) {
            *slot = color;
        }
    }

    /// True iff all six faces hold nine known colors.
    pub fn is_complete(&self) -> bool {
        Face::ORDER.iter().all(|face| {
            self.faces.get(face).is_some_and(|stickers| {
                stickers.len() == STICKERS_PER_FACE && stickers.iter().all(|c| c.is_known())
            })
        })
    }
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self::empty()
    }
}

/// Merges per-camera detections into one layout.
///
/// Cameras are visited in id order and detections in list order; when two
/// detections target the same slot the later one wins.
pub fn assemble(detections: &DetectionSet) -> (FaceLayout, bool) {
    let mut layout = FaceLayout::empty();
    for sticker in detections.values().flatten() {
        let index = sticker.index as usize;
        if index < STICKERS_PER_FACE {
            layout.set(sticker.face, index, sticker.color);
        }
    }
    let complete = layout.is_complete();
    (layout, complete)
}
