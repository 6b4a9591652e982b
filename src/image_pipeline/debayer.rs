//! Debayering module for converting CFA grids to RGB

pub mod cpu_debayer;
pub mod types;

pub use cpu_debayer::CpuDebayer;
pub use types::RgbImageData;
