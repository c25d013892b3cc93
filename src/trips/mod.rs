pub mod engine;
pub mod error;
pub mod frame;
pub mod heatmap;
pub mod hexbin;
pub mod time_slices;
