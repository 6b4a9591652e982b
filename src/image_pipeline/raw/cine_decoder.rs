//! Pixel payload decoding for CINE frames.
//!
//! Selects the unpacking path from the bitmap header, restores top-down row
//! order and rescales sensor codes using the setup's black and white levels.

use tracing::debug;

use crate::image_pipeline::cine::{Compression, Header};
use crate::image_pipeline::common::cfa::CfaPattern;
use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::raw::defects::correct_defects;
use crate::image_pipeline::raw::levels::{LevelMapper, P10_LEVELS, P10_OUTPUT_BITS, linearize_p10};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{DecodeOptions, P10Rescale, RawFrame};
use crate::image_pipeline::raw::unpack::{flip_rows, unpack_p10, unpack_p12l, unpack_u8, unpack_u16};

/// Decoder for the payloads of one CINE file.
#[derive(Debug, Clone)]
pub struct CineFrameDecoder {
    width: usize,
    height: usize,
    bottom_up: bool,
    compression: Compression,
    bit_count: u16,
    real_bpp: u32,
    black_level: i32,
    white_level: i32,
    cfa_code: u32,
    options: DecodeOptions,
}

impl CineFrameDecoder {
    pub fn from_header(header: &Header, options: DecodeOptions) -> Self {
        Self {
            width: header.bitmap.width(),
            height: header.bitmap.height(),
            bottom_up: header.bitmap.is_bottom_up(),
            compression: header.bitmap.compression(),
            bit_count: header.bitmap.bit_count,
            real_bpp: header.setup.real_bpp(),
            black_level: header.setup.black_level(),
            white_level: header.setup.white_level(),
            cfa_code: header.setup.cfa(),
            options,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Sensor black and white levels, or the full `RealBPP` range when the
    /// setup does not carry a usable pair.
    fn sensor_levels(&self) -> (f64, f64) {
        if self.white_level > self.black_level {
            (self.black_level as f64, self.white_level as f64)
        } else {
            debug!(
                black = self.black_level,
                white = self.white_level,
                "no usable sensor levels, using the full RealBPP range"
            );
            (0.0, ((1u64 << self.real_bpp.min(16)) - 1) as f64)
        }
    }

    fn sensor_mapper(&self) -> Result<LevelMapper> {
        let (low, high) = self.sensor_levels();
        LevelMapper::new(low, high, self.real_bpp)
    }

    fn correct(&self, samples: &mut [u16]) -> Result<()> {
        if !self.options.defect_correction {
            return Ok(());
        }
        if self.white_level <= 0 {
            debug!("defect correction skipped, setup has no white level");
            return Ok(());
        }
        let pattern = CfaPattern::from_code(self.cfa_code)?;
        let threshold = self.white_level.min(u16::MAX as i32) as u16;
        correct_defects(samples, self.width, self.height, threshold, pattern);
        Ok(())
    }
}

impl RawImageReader for CineFrameDecoder {
    fn read_raw(&self, data: &[u8]) -> Result<RawFrame> {
        let count = self.width * self.height;
        if count == 0 {
            return Err(CineError::Format(format!(
                "frame has no pixels ({}x{})",
                self.width, self.height
            )));
        }

        let (samples, bits) = match self.compression {
            Compression::Uncompressed => {
                let mut samples = match self.bit_count {
                    16 => unpack_u16(data, count)?,
                    8 => unpack_u8(data, count)?,
                    other => {
                        return Err(CineError::UnsupportedFormat(format!(
                            "{other} bits per pixel in an uncompressed frame"
                        )));
                    }
                };
                if self.bottom_up {
                    flip_rows(&mut samples, self.width);
                }
                self.correct(&mut samples)?;
                let mapper = self.sensor_mapper()?;
                mapper.apply(&mut samples);
                (samples, self.real_bpp)
            }
            Compression::Packed10 => {
                let mut samples = unpack_p10(data, count)?;
                linearize_p10(&mut samples);
                self.correct(&mut samples)?;
                let (mapper, bits) = match self.options.p10_rescale {
                    P10Rescale::Fixed => (
                        LevelMapper::new(P10_LEVELS.0, P10_LEVELS.1, P10_OUTPUT_BITS)?,
                        P10_OUTPUT_BITS,
                    ),
                    P10Rescale::FromSetup => (self.sensor_mapper()?, self.real_bpp),
                };
                mapper.apply(&mut samples);
                (samples, bits)
            }
            Compression::Packed12L => {
                let mut samples = unpack_p12l(data, count)?;
                self.correct(&mut samples)?;
                self.sensor_mapper()?.apply(&mut samples);
                (samples, self.real_bpp)
            }
            Compression::Other(code) => {
                return Err(CineError::UnsupportedFormat(format!("compression code {code}")));
            }
        };

        Ok(RawFrame { width: self.width, height: self.height, data: samples, bits_per_sample: bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cine::{BitmapInfo, ContainerHeader, Setup, TaggedBlocks};
    use crate::image_pipeline::raw::unpack::unpack_p10_group;

    fn header(width: i32, height: i32, compression: u32, bit_count: u16) -> Header {
        let mut setup = Setup::full();
        setup.set_real_bpp(12).unwrap();
        setup.set_levels(0, 4095).unwrap();
        setup.set_cfa(4).unwrap();
        Header {
            container: ContainerHeader::default(),
            bitmap: BitmapInfo { width, height, compression, bit_count, ..Default::default() },
            setup,
            offsets: Vec::new(),
            tagged: TaggedBlocks::default(),
        }
    }

    fn decode(header: &Header, options: DecodeOptions, data: &[u8]) -> Result<RawFrame> {
        CineFrameDecoder::from_header(header, options).read_raw(data)
    }

    #[test]
    fn test_uncompressed_16_is_flipped() {
        let h = header(2, 2, 0, 16);
        // Stored bottom row first: bottom row = [3, 4], top row = [1, 2].
        let data: Vec<u8> = [3u16, 4, 1, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let frame = decode(&h, DecodeOptions::default(), &data).unwrap();
        assert_eq!(frame.data, vec![1, 2, 3, 4]);
        assert_eq!(frame.bits_per_sample, 12);
    }

    #[test]
    fn test_top_down_bitmap_is_not_flipped() {
        let h = header(2, -2, 0, 8);
        let frame = decode(&h, DecodeOptions::default(), &[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_uncompressed_rescales_levels() {
        let mut h = header(2, 1, 0, 16);
        h.setup.set_levels(100, 1100).unwrap();
        h.setup.set_real_bpp(10).unwrap();
        let data: Vec<u8> = [50u16, 2000].iter().flat_map(|v| v.to_le_bytes()).collect();
        let frame = decode(&h, DecodeOptions::default(), &data).unwrap();
        assert_eq!(frame.data, vec![0, 1023]);
    }

    #[test]
    fn test_p10_fixed_range() {
        let h = header(4, 1, 256, 0);
        let bytes = [0b1011_0100, 0b0111_0010, 0b0010_1101, 0b1101_0010, 0b0101_0101];
        let frame = decode(&h, DecodeOptions::default(), &bytes).unwrap();
        assert_eq!(frame.bits_per_sample, 12);

        let mapper = LevelMapper::new(64.0, 4064.0, 12).unwrap();
        let expected: Vec<u16> = unpack_p10_group(bytes)
            .iter()
            .map(|&c| mapper.map(crate::image_pipeline::raw::lut::LINEARIZATION_LUT[c as usize]))
            .collect();
        assert_eq!(frame.data, expected);
    }

    #[test]
    fn test_p10_from_setup_range() {
        let mut h = header(4, 1, 256, 0);
        h.setup.set_real_bpp(10).unwrap();
        let options = DecodeOptions::builder().p10_rescale(P10Rescale::FromSetup).build();
        let frame = decode(&h, options, &[0xFF; 5]).unwrap();
        assert_eq!(frame.bits_per_sample, 10);
        assert_eq!(frame.data, vec![1023; 4]);
    }

    #[test]
    fn test_p12l() {
        let mut h = header(2, 1, 1024, 0);
        h.setup.set_levels(0, 4095).unwrap();
        let frame = decode(&h, DecodeOptions::default(), &[0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(frame.data, vec![0xABC, 0xDEF]);
    }

    #[test]
    fn test_unsupported_formats() {
        let h = header(2, 1, 2, 16);
        assert!(matches!(
            decode(&h, DecodeOptions::default(), &[0u8; 4]),
            Err(CineError::UnsupportedFormat(_))
        ));
        let h = header(2, 1, 0, 12);
        assert!(matches!(
            decode(&h, DecodeOptions::default(), &[0u8; 4]),
            Err(CineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_defect_correction_before_rescale() {
        let mut h = header(3, 3, 0, 16);
        h.setup.set_cfa(0).unwrap();
        h.setup.set_levels(0, 1000).unwrap();
        let mut grid = vec![10u16; 9];
        grid[4] = 2000;
        let data: Vec<u8> = grid.iter().flat_map(|v| v.to_le_bytes()).collect();

        let plain = decode(&h, DecodeOptions::default(), &data).unwrap();
        assert_eq!(plain.data[4], 4095);

        let options = DecodeOptions::builder().defect_correction(true).build();
        let corrected = decode(&h, options, &data).unwrap();
        assert_eq!(corrected.data[4], corrected.data[0]);
    }
}
