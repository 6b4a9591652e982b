//! RAW frame data types

use crate::image_pipeline::cine::{Compression, Header};

/// A decoded sensor frame: one integer sample per pixel, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Samples normalized to `[0, 2^bits_per_sample - 1]` (single channel CFA grid)
    pub data: Vec<u16>,
    /// Bit depth of the normalized samples
    pub bits_per_sample: u32,
}

impl RawFrame {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }

    pub fn max_value(&self) -> u16 {
        ((1u32 << self.bits_per_sample) - 1) as u16
    }
}

/// One stored frame record, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Opaque annotation bytes, `annotationSize - 8` of them.
    pub annotation: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Target range of the 10-bit packed path after linearization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum P10Rescale {
    /// `[64, 4064] -> [0, 4095]`, a 12-bit result regardless of the setup.
    #[default]
    Fixed,
    /// `[BlackLevel, WhiteLevel] -> [0, 2^RealBPP - 1]`, like the other paths.
    FromSetup,
}

/// Options for turning pixel payloads into `RawFrame`s.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub p10_rescale: P10Rescale,
    /// Replace samples above `WhiteLevel` with a same-color median.
    pub defect_correction: bool,
}

impl DecodeOptions {
    pub fn builder() -> DecodeOptionsBuilder {
        DecodeOptionsBuilder::default()
    }

    /// Bit depth of frames decoded from `header` with these options.
    pub fn output_bits(&self, header: &Header) -> u32 {
        match (header.bitmap.compression(), self.p10_rescale) {
            (Compression::Packed10, P10Rescale::FromSetup) => header.setup.real_bpp(),
            _ => header.bits_per_pixel(),
        }
    }
}

#[derive(Default)]
pub struct DecodeOptionsBuilder {
    p10_rescale: Option<P10Rescale>,
    defect_correction: Option<bool>,
}

impl DecodeOptionsBuilder {
    pub fn p10_rescale(mut self, rescale: P10Rescale) -> Self {
        self.p10_rescale = Some(rescale);
        self
    }

    pub fn defect_correction(mut self, enable: bool) -> Self {
        self.defect_correction = Some(enable);
        self
    }

    pub fn build(self) -> DecodeOptions {
        let default = DecodeOptions::default();
        DecodeOptions {
            p10_rescale: self.p10_rescale.unwrap_or(default.p10_rescale),
            defect_correction: self.defect_correction.unwrap_or(default.defect_correction),
        }
    }
}
