use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::RawFrame;

/// Turns one frame's pixel payload into a `RawFrame`.
pub trait RawImageReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawFrame>;
}
