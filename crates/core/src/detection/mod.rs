pub mod detection_pipeline;
pub mod domain;
