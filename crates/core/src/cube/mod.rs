pub mod face_layout;
pub mod orientation_resolver;
