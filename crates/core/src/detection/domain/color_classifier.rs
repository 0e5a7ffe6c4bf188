use crate::detection::domain::region_sampler::Hsv;
use crate::shared::cube::ColorCode;

const WHITE_MAX_SATURATION: f64 = 35.0;
const WHITE_MIN_VALUE: f64 = 120.0;
const WHITE_CONFIDENCE: f64 = 0.78;

const HUE_WEIGHT: f64 = 0.55;
const SATURATION_WEIGHT: f64 = 0.25;
const VALUE_WEIGHT: f64 = 0.20;

const HUE_RANGE: f64 = 180.0;
const MIN_CONFIDENCE: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.99;
const SCORE_EPSILON: f64 = 1e-6;

/// Reference HSV centroid for one sticker color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorPrototype {
    pub color: ColorCode,
    pub hsv: Hsv,
}

/// Prototype table for standard sticker sets under indoor lighting.
pub fn default_prototypes() -> Vec<ColorPrototype> {
    [
        (ColorCode::White, 0.0, 15.0, 235.0),
        (ColorCode::Yellow, 30.0, 220.0, 220.0),
        (ColorCode::Red, 2.0, 230.0, 210.0),
        (ColorCode::Orange, 17.0, 235.0, 230.0),
        (ColorCode::Blue, 108.0, 230.0, 200.0),
        (ColorCode::Green, 65.0, 225.0, 180.0),
    ]
    .into_iter()
    .map(|(color, h, s, v)| ColorPrototype {
        color,
        hsv: Hsv::new(h, s, v),
    })
    .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub color: ColorCode,
    pub confidence: f64,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            color: ColorCode::Unknown,
            confidence: 0.0,
        }
    }
}

/// Nearest-prototype color matcher over mean HSV samples.
///
/// Confidence measures separation from the runner-up prototype rather
/// than an absolute probability.
#[derive(Clone, Debug)]
pub struct ColorClassifier {
    prototypes: Vec<ColorPrototype>,
}

impl ColorClassifier {
    pub fn new(prototypes: Vec<ColorPrototype>) -> Self {
        Self { prototypes }
    }

    pub fn prototypes(&self) -> &[ColorPrototype] {
        &self.prototypes
    }

    /// Classifies a sample; `None` (no signal) maps to [`Classification::unknown`].
    pub fn classify(&self, sample: Option<Hsv>) -> Classification {
        let Some(hsv) = sample else {
            return Classification::unknown();
        };

        // Washed-out samples sit between several hue prototypes.
        if hsv.s < WHITE_MAX_SATURATION && hsv.v > WHITE_MIN_VALUE {
            return Classification {
                color: ColorCode::White,
                confidence: WHITE_CONFIDENCE,
            };
        }

        let mut scored: Vec<(f64, ColorCode)> = self
            .prototypes
            .iter()
            .map(|p| (prototype_distance(hsv, p.hsv), p.color))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let Some(&(best_score, best_color)) = scored.first() else {
            return Classification::unknown();
        };
        let second_score = scored.get(1).map_or(1.0, |s| s.0);

        let confidence = (1.0 - best_score / (second_score + SCORE_EPSILON))
            .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        Classification {
            color: best_color,
            confidence,
        }
    }
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new(default_prototypes())
    }
}

/// Weighted distance: circular hue on a 180 wheel, linear saturation/value.
pub fn prototype_distance(sample: Hsv, prototype: Hsv) -> f64 {
    let raw = (sample.h - prototype.h).abs();
    let hue = raw.min(HUE_RANGE - raw) / 90.0;
    let sat = (sample.s - prototype.s).abs() / 255.0;
    let val = (sample.v - prototype.v).abs() / 255.0;
    HUE_WEIGHT * hue + SATURATION_WEIGHT * sat + VALUE_WEIGHT * val
}
