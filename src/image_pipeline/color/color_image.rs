use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::debayer::RgbImageData;

/// Floating-point RGB image, interleaved, nominally in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ColorImage {
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [f32; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Rescales to integers in `[0, 2^bits - 1]`, rounding to nearest.
    pub fn to_rgb16(&self, bits: u32) -> Result<RgbImageData> {
        if !(1..=16).contains(&bits) {
            return Err(CineError::UnsupportedFormat(format!("{bits}-bit RGB output")));
        }
        let max = ((1u32 << bits) - 1) as f32;
        let data = self
            .data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * max).round() as u16)
            .collect();
        Ok(RgbImageData { width: self.width, height: self.height, data, bits_per_sample: bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rgb16_scales_and_clamps() {
        let img = ColorImage { width: 1, height: 1, data: vec![0.0, 0.5, 1.5] };
        let out = img.to_rgb16(16).unwrap();
        assert_eq!(out.data, vec![0, 32768, 65535]);
        assert_eq!(img.to_rgb16(8).unwrap().data, vec![0, 128, 255]);
        assert!(img.to_rgb16(0).is_err());
        assert!(img.to_rgb16(17).is_err());
    }
}
