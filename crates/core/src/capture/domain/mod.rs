pub mod capture_backend;
pub mod snapshot_writer;
