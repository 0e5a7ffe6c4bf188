pub mod region_layout;
pub mod region_store;
