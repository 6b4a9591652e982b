//! TIFF writing module
//!
//! Encodes decoded frames as 16-bit grayscale CFA data or 16-bit RGB, with
//! the usual TIFF compression options.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, TiffCompression};
pub use writer::TiffWriter;
