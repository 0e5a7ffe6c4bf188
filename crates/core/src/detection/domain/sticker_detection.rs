use serde::{Deserialize, Serialize};

use crate::detection::domain::color_classifier::Classification;
use crate::detection::domain::sticker_region::StickerRegion;
use crate::shared::cube::{ColorCode, Face};

/// Classified color of one sticker region at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StickerDetection {
    pub id: String,
    pub face: Face,
    pub index: u8,
    pub color: ColorCode,
    pub color_name: String,
    pub confidence: f64,
    pub label: String,
}

impl StickerDetection {
    pub fn new(region: &StickerRegion, classification: Classification) -> Self {
        let pct = (classification.confidence * 100.0).round() as u32;
        Self {
            id: region.id.clone(),
            face: region.face,
            index: region.index,
            color: classification.color,
            color_name: classification.color.name().to_string(),
            confidence: (classification.confidence * 1000.0).round() / 1000.0,
            label: format!("{}{}%", classification.color, pct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn region() -> StickerRegion {
        StickerRegion {
            id: "F3".into(),
            face: Face::F,
            index: 3,
            x: 0.1,
            y: 0.1,
            w: 0.05,
            h: 0.05,
        }
    }

    #[test]
    fn test_label_combines_code_and_percentage() {
        let d = StickerDetection::new(
            &region(),
            Classification {
                color: ColorCode::Blue,
                confidence: 0.8766,
            },
        );
        assert_eq!(d.label, "B88%");
        assert_eq!(d.color_name, "Blue");
        assert_relative_eq!(d.confidence, 0.877);
        assert_eq!((d.face, d.index), (Face::F, 3));
    }

    #[test]
    fn test_unknown_label() {
        let d = StickerDetection::new(&region(), Classification::unknown());
        assert_eq!(d.label, "?0%");
        assert_eq!(d.color_name, "Unknown");
    }
}
