pub mod color_classifier;
pub mod frame_source;
pub mod region_sampler;
pub mod sticker_detection;
pub mod sticker_region;
