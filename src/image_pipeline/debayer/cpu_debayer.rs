use std::io::Cursor;

use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::image_pipeline::common::cfa::CfaPattern;
use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::debayer::types::RgbImageData;
use crate::image_pipeline::raw::types::RawFrame;

/// Bilinear demosaic on the CPU, one frame at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    /// Reconstructs a full-resolution RGB image from `raw`.
    ///
    /// Monochrome frames are replicated into all three channels.
    pub fn process(&self, raw: &RawFrame, pattern: CfaPattern) -> Result<RgbImageData> {
        let (width, height) = (raw.width, raw.height);
        if raw.data.len() != width * height {
            return Err(CineError::Demosaic(format!(
                "{} samples for a {width}x{height} frame",
                raw.data.len()
            )));
        }

        let Some(cfa) = pattern.to_bayer() else {
            debug!(width, height, "monochrome frame, replicating gray into RGB");
            let data = raw.data.iter().flat_map(|&v| [v, v, v]).collect();
            return Ok(RgbImageData { width, height, data, bits_per_sample: raw.bits_per_sample });
        };

        if width < 2 || height < 2 {
            return Err(CineError::Demosaic(format!(
                "{width}x{height} is smaller than one CFA tile"
            )));
        }

        debug!(width, height, pattern = pattern.as_str(), "running demosaic");

        let input: Vec<u8> = raw.data.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut output = vec![0u8; width * height * 3 * 2];
        {
            let mut raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output);
            bayer::run_demosaic(
                &mut Cursor::new(&input[..]),
                BayerDepth::Depth16LE,
                cfa,
                Demosaic::Linear,
                &mut raster,
            )
            .map_err(|e| CineError::Demosaic(format!("{e:?}")))?;
        }

        // The raster stores 16-bit samples in native byte order.
        let data = output
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();

        Ok(RgbImageData { width, height, data, bits_per_sample: raw.bits_per_sample })
    }
}
