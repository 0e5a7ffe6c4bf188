use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::capture::infrastructure::glyphs::draw_text_mut;
use crate::shared::camera_id::CameraId;
use crate::shared::frame::Frame;

const BACKGROUND: Rgb<u8> = Rgb([242, 239, 233]);
const TEXT: Rgb<u8> = Rgb([81, 66, 36]);
const BORDER: Rgb<u8> = Rgb([145, 124, 68]);

const MARGIN: u32 = 20;
const BORDER_THICKNESS: u32 = 3;
const TEXT_LEFT: u32 = 30;
const TITLE_TOP: u32 = 50;
const TITLE_SCALE: u32 = 4;
const MESSAGE_TOP: u32 = 120;
const MESSAGE_SCALE: u32 = 2;
const MAX_MESSAGE_CHARS: usize = 80;

/// Flat "camera unavailable" canvas with the camera id and a status line.
///
/// Always a valid frame: zero dimensions are bumped to one pixel.
pub fn placeholder_frame(camera: CameraId, message: &str, width: u32, height: u32) -> Frame {
    let (width, height) = (width.max(1), height.max(1));
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    draw_text_mut(
        &mut canvas,
        TEXT_LEFT,
        TITLE_TOP,
        &format!("Camera {camera}"),
        TITLE_SCALE,
        TEXT,
    );
    let message: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
    draw_text_mut(&mut canvas, TEXT_LEFT, MESSAGE_TOP, &message, MESSAGE_SCALE, TEXT);

    for inset in 0..BORDER_THICKNESS {
        let edge = MARGIN + inset;
        if width <= 2 * edge || height <= 2 * edge {
            break;
        }
        let rect = Rect::at(edge as i32, edge as i32).of_size(width - 2 * edge, height - 2 * edge);
        draw_hollow_rect_mut(&mut canvas, rect, BORDER);
    }

    Frame::placeholder(canvas.into_raw(), width, height)
}
