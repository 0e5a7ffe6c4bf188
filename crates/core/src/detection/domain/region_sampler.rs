use ndarray::{s, Axis};

use crate::detection::domain::sticker_region::{PixelRect, StickerRegion};
use crate::shared::frame::Frame;

/// Mean color of a sample window in 8-bit HSV.
///
/// Uses the common 8-bit convention: hue in `[0, 180)` (degrees halved),
/// saturation and value in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }
}

/// Maps a normalized region to a pixel rectangle inside a `frame_width ×
/// frame_height` image. The result always spans at least one pixel on each
/// axis.
pub fn region_to_pixels(region: &StickerRegion, frame_width: u32, frame_height: u32) -> PixelRect {
    let fw = frame_width as f64;
    let fh = frame_height as f64;

    let x1 = (region.x.clamp(0.0, 0.999) * fw) as u32;
    let y1 = (region.y.clamp(0.0, 0.999) * fh) as u32;
    let x2 = ((region.x + region.w).clamp(0.001, 1.0) * fw) as u32;
    let y2 = ((region.y + region.h).clamp(0.001, 1.0) * fh) as u32;

    PixelRect {
        x1,
        y1,
        x2: x2.max(x1 + 1),
        y2: y2.max(y1 + 1),
    }
}

/// Averages the 8-bit HSV values of every pixel inside `rect`.
///
/// Returns `None` when the rectangle does not overlap the frame, which the
/// classifier reports as "no signal".
pub fn sample_mean_hsv(frame: &Frame, rect: PixelRect) -> Option<Hsv> {
    let clipped = rect.clipped_to(frame.width(), frame.height());
    if clipped.is_empty() || !frame.is_valid() {
        return None;
    }

    let pixels = frame.as_ndarray();
    let crop = pixels.slice(s![
        clipped.y1 as usize..clipped.y2 as usize,
        clipped.x1 as usize..clipped.x2 as usize,
        ..
    ]);

    let (mut h_sum, mut s_sum, mut v_sum) = (0.0, 0.0, 0.0);
    let mut count = 0usize;
    for row in crop.axis_iter(Axis(0)) {
        for px in row.axis_iter(Axis(0)) {
            let (h, s, v) = rgb_to_hsv8(px[0], px[1], px[2]);
            h_sum += h as f64;
            s_sum += s as f64;
            v_sum += v as f64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(Hsv::new(h_sum / n, s_sum / n, v_sum / n))
}

/// Converts one RGB pixel to 8-bit HSV (`h` in `0..180`).
pub fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    let h = (h_deg / 2.0).round() as u32 % 180;
    (h as u8, s.round() as u8, v.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cube::Face;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn region(x: f64, y: f64, w: f64, h: f64) -> StickerRegion {
        StickerRegion {
            id: "U0".into(),
            face: Face::U,
            index: 0,
            x,
            y,
            w,
            h,
        }
    }

    // ── region_to_pixels ────────────────────────────────────────────

    #[test]
    fn test_region_to_pixels_scales_coordinates() {
        let rect = region_to_pixels(&region(0.1, 0.25, 0.2, 0.5), 100, 200);
        assert_eq!(
            rect,
            PixelRect {
                x1: 10,
                y1: 50,
                x2: 30,
                y2: 150
            }
        );
    }

    #[rstest]
    #[case::tiny_region(region(0.5, 0.5, 0.0001, 0.0001), 640, 480)]
    #[case::one_pixel_frame(region(0.2, 0.2, 0.3, 0.3), 1, 1)]
    #[case::far_corner(region(1.0, 1.0, 0.1, 0.1), 10, 10)]
    #[case::negative_origin(region(-0.5, -0.5, 0.2, 0.2), 300, 200)]
    #[case::oversized(region(0.0, 0.0, 5.0, 5.0), 7, 3)]
    fn test_region_to_pixels_never_degenerate(
        #[case] r: StickerRegion,
        #[case] w: u32,
        #[case] h: u32,
    ) {
        let rect = region_to_pixels(&r, w, h);
        assert!(rect.x2 > rect.x1, "{rect:?}");
        assert!(rect.y2 > rect.y1, "{rect:?}");
    }

    #[test]
    fn test_region_to_pixels_clamps_far_edge() {
        let rect = region_to_pixels(&region(0.9, 0.9, 0.5, 0.5), 100, 100);
        assert_eq!(rect.x2, 100);
        assert_eq!(rect.y2, 100);
    }

    // ── HSV conversion ──────────────────────────────────────────────

    #[rstest]
    #[case::red(255, 0, 0, (0, 255, 255))]
    #[case::green(0, 255, 0, (60, 255, 255))]
    #[case::blue(0, 0, 255, (120, 255, 255))]
    #[case::yellow(255, 255, 0, (30, 255, 255))]
    #[case::white(255, 255, 255, (0, 0, 255))]
    #[case::black(0, 0, 0, (0, 0, 0))]
    #[case::magenta_wraps(255, 0, 128, (165, 255, 255))]
    fn test_rgb_to_hsv8(#[case] r: u8, #[case] g: u8, #[case] b: u8, #[case] expected: (u8, u8, u8)) {
        assert_eq!(rgb_to_hsv8(r, g, b), expected);
    }

    // ── sample_mean_hsv ─────────────────────────────────────────────

    #[test]
    fn test_mean_of_uniform_crop() {
        let frame = Frame::filled(20, 20, [0, 0, 255]);
        let rect = PixelRect {
            x1: 2,
            y1: 2,
            x2: 8,
            y2: 8,
        };
        let hsv = sample_mean_hsv(&frame, rect).unwrap();
        assert_relative_eq!(hsv.h, 120.0);
        assert_relative_eq!(hsv.s, 255.0);
        assert_relative_eq!(hsv.v, 255.0);
    }

    #[test]
    fn test_mean_only_covers_crop() {
        // Left half black, right half white; sample only the right half.
        let mut frame = Frame::filled(4, 2, [0, 0, 0]);
        for row in 0..2 {
            for col in 2..4 {
                let i = (row * 4 + col) * 3;
                frame.data_mut()[i..i + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let rect = PixelRect {
            x1: 2,
            y1: 0,
            x2: 4,
            y2: 2,
        };
        let hsv = sample_mean_hsv(&frame, rect).unwrap();
        assert_relative_eq!(hsv.v, 255.0);
        assert_relative_eq!(hsv.s, 0.0);
    }

    #[test]
    fn test_mean_averages_mixed_values() {
        // One black pixel and one white pixel → V = 127.5
        let frame = Frame::new(vec![0, 0, 0, 255, 255, 255], 2, 1, 0);
        let rect = PixelRect {
            x1: 0,
            y1: 0,
            x2: 2,
            y2: 1,
        };
        let hsv = sample_mean_hsv(&frame, rect).unwrap();
        assert_relative_eq!(hsv.v, 127.5);
    }

    #[test]
    fn test_crop_outside_frame_has_no_signal() {
        let frame = Frame::filled(10, 10, [255, 0, 0]);
        let rect = PixelRect {
            x1: 10,
            y1: 10,
            x2: 12,
            y2: 12,
        };
        assert!(sample_mean_hsv(&frame, rect).is_none());
    }

    #[test]
    fn test_crop_partially_outside_is_clipped() {
        let frame = Frame::filled(10, 10, [255, 0, 0]);
        let rect = PixelRect {
            x1: 8,
            y1: 8,
            x2: 40,
            y2: 40,
        };
        let hsv = sample_mean_hsv(&frame, rect).unwrap();
        assert_relative_eq!(hsv.s, 255.0);
    }
}
