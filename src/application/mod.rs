pub mod dataset_diff;
pub mod diff;
pub mod monitoring;
pub mod render;
