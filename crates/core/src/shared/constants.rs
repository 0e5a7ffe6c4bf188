use crate::shared::camera_id::CameraId;
use crate::shared::cube::Face;

pub const DEFAULT_CAMERA_IDS: [CameraId; 2] = [CameraId::new(0), CameraId::new(1)];

pub const STICKERS_PER_FACE: usize = 9;
pub const CENTER_INDEX: usize = 4;
pub const FACES_PER_CAMERA: usize = 3;
pub const REGIONS_PER_CAMERA: usize = STICKERS_PER_FACE * FACES_PER_CAMERA;

pub const DEFAULT_FRAME_WIDTH: u32 = 960;
pub const DEFAULT_FRAME_HEIGHT: u32 = 720;
pub const DEFAULT_FPS: u32 = 25;
pub const DEFAULT_RECONNECT_SECS: f64 = 2.0;
pub const MIN_RECONNECT_MILLIS: u64 = 100;

pub const DEFAULT_UART_PORT: &str = "/dev/ttyAMA0";
pub const DEFAULT_UART_BAUD: u32 = 115_200;
pub const DEFAULT_UART_TIMEOUT_SECS: f64 = 1.0;

pub const SNAPSHOT_JPEG_QUALITY: u8 = 80;

/// Faces each camera sees, left to right in its image.
pub fn camera_faces(camera_id: CameraId) -> Option<[Face; FACES_PER_CAMERA]> {
    match camera_id.value() {
        0 => Some([Face::U, Face::F, Face::R]),
        1 => Some([Face::D, Face::B, Face::L]),
        _ => None,
    }
}
