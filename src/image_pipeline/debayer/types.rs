//! Types for debayering operations

/// RGB image data after debayering
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u16>,
    /// Bit depth of the samples, carried over from the raw frame
    pub bits_per_sample: u32,
}

impl RgbImageData {
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [u16; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
