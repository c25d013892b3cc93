pub mod distance;
pub mod gcj02;
