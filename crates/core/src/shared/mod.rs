pub mod camera_id;
pub mod constants;
pub mod cube;
pub mod frame;
