pub mod config;
pub mod lat_lon;
pub mod order;
