use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::RgbImageData;
use crate::image_pipeline::raw::types::RawFrame;
use crate::image_pipeline::tiff::types::ConversionConfig;

pub trait TiffWriter {
    /// Single-channel CFA samples, as decoded.
    fn write_raw(&self, image: &RawFrame, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
    fn write_rgb(&self, image: &RgbImageData, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
