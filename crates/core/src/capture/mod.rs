pub mod camera_manager;
pub mod camera_stream;
pub mod capture_config;
pub mod domain;
pub mod infrastructure;
