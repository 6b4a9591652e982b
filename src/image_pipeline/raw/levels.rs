//! Linear rescaling of sensor codes into a normalized bit-depth range.

use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::raw::lut::LINEARIZATION_LUT;

/// Low and high bounds of the linearized 10-bit packed range.
pub const P10_LEVELS: (f64, f64) = (64.0, 4064.0);
pub const P10_OUTPUT_BITS: u32 = 12;

/// Maps `[low, high]` linearly onto `[0, 2^bits - 1]`, clamping outside and truncating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMapper {
    low: f64,
    high: f64,
    max_out: f64,
}

impl LevelMapper {
    pub fn new(low: f64, high: f64, bits: u32) -> Result<Self> {
        if !(1..=16).contains(&bits) {
            return Err(CineError::UnsupportedFormat(format!("{bits}-bit output range")));
        }
        Ok(Self { low, high, max_out: ((1u32 << bits) - 1) as f64 })
    }

    pub fn max_out(&self) -> u16 {
        self.max_out as u16
    }

    #[inline]
    pub fn map(&self, code: u16) -> u16 {
        let x = code as f64;
        if x <= self.low {
            0
        } else if x >= self.high {
            self.max_out as u16
        } else {
            ((x - self.low) * self.max_out / (self.high - self.low)) as u16
        }
    }

    pub fn apply(&self, samples: &mut [u16]) {
        for s in samples.iter_mut() {
            *s = self.map(*s);
        }
    }
}

/// Replaces 10-bit packed codes with their linear 12-bit values.
pub fn linearize_p10(samples: &mut [u16]) {
    for s in samples.iter_mut() {
        *s = LINEARIZATION_LUT[(*s & 0x3FF) as usize];
    }
}
