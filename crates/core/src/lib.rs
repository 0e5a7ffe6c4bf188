pub mod capture;
pub mod control;
pub mod cube;
pub mod detection;
pub mod pipeline;
pub mod regions;
pub mod shared;
