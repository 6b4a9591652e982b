//! Color processing module
//!
//! Turns a decoded CFA frame into display RGB: calibration-matrix
//! decomposition, white balance, demosaic, the setup's image controls and
//! the optional crop/resample geometry stored with the clip.

mod config;
mod color_image;
pub mod matrix;
mod pipeline;
pub mod post;
pub mod ycc;

pub use config::{ColorConfig, ColorConfigBuilder, GammaMode, MatrixNormalization};
pub use color_image::ColorImage;
pub use matrix::{Decomposition, decompose_calibration_matrix};
pub use pipeline::{ColorPipeline, apply_color_pipeline};
