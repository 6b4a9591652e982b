//! RAW frame to display RGB.
//!
//! Order of operations:
//!  1. subtract flare
//!  2. decompose the calibration matrix into white balance and color correction
//!  3. white balance the CFA grid, per channel
//!  4. demosaic
//!  5. normalize to `[0, 1]` by `2^bpp - 1`
//!  6. color correction matrix
//!  7. user matrix, when enabled
//!  8. offset, global gain, per-channel gains
//!  9. gamma
//! 10. tone curve
//! 11. pedestal, keeping the white point at 1
//! 12. Rec. 709 YCbCr
//! 13. chroma scale
//! 14. hue rotation, back to RGB, clamp to `[0, 1]`

use tracing::{debug, debug_span};

use crate::image_pipeline::cine::{ImageAdjustments, Matrix3, Setup, ToneCurve};
use crate::image_pipeline::color::color_image::ColorImage;
use crate::image_pipeline::color::config::{ColorConfig, GammaMode};
use crate::image_pipeline::color::matrix::{decompose_calibration_matrix, mul_vec};
use crate::image_pipeline::color::post::apply_setup_geometry;
use crate::image_pipeline::color::ycc::{ChromaAdjust, rgb_to_ycbcr, ycbcr_to_rgb};
use crate::image_pipeline::common::cfa::{CfaPattern, Channel};
use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::debayer::CpuDebayer;
use crate::image_pipeline::raw::types::RawFrame;

/// Applies the color pipeline with the default configuration.
pub fn apply_color_pipeline(raw: &RawFrame, setup: &Setup, bpp: u32) -> Result<ColorImage> {
    ColorPipeline::default().process(raw, setup, bpp)
}

#[derive(Debug, Clone, Default)]
pub struct ColorPipeline {
    config: ColorConfig,
    debayer: CpuDebayer,
}

impl ColorPipeline {
    pub fn new(config: ColorConfig) -> Self {
        Self { config, debayer: CpuDebayer::new() }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    /// Processes `raw`, whose samples span `[0, 2^bpp - 1]`.
    pub fn process(&self, raw: &RawFrame, setup: &Setup, bpp: u32) -> Result<ColorImage> {
        let _span = debug_span!("color_pipeline", width = raw.width, height = raw.height, bpp).entered();

        if !(1..=16).contains(&bpp) {
            return Err(CineError::UnsupportedFormat(format!("{bpp} bits per pixel")));
        }
        if raw.data.len() != raw.width * raw.height {
            return Err(CineError::Format(format!(
                "{} samples for a {}x{} frame",
                raw.data.len(),
                raw.width,
                raw.height
            )));
        }
        let max = ((1u32 << bpp) - 1) as f32;
        let pattern = CfaPattern::from_code(setup.cfa())?;

        let image = if pattern.is_color() {
            self.process_color(raw, setup, pattern, max)?
        } else {
            debug!("monochrome sensor, passing gray through");
            let data = raw.data.iter().flat_map(|&v| [v as f32 / max; 3]).collect();
            ColorImage { width: raw.width, height: raw.height, data }
        };

        if self.config.post_process {
            apply_setup_geometry(image, setup)
        } else {
            Ok(image)
        }
    }

    fn process_color(
        &self,
        raw: &RawFrame,
        setup: &Setup,
        pattern: CfaPattern,
        max: f32,
    ) -> Result<ColorImage> {
        let decomposition = decompose_calibration_matrix(&setup.calib_matrix(), self.config.normalization);
        debug!(white_balance = ?decomposition.white_balance, "decomposed calibration matrix");

        let balanced = white_balance(raw, pattern, self.config.flare, decomposition.white_balance);
        let rgb = self.debayer.process(&balanced, pattern)?;

        let user_matrix = (self.config.apply_user_matrix && setup.matrices_enabled())
            .then(|| setup.user_matrix());
        let ops = PixelOps::new(
            decomposition.color_matrix,
            user_matrix,
            &setup.adjustments(),
            self.config.gamma,
            setup.tone_curve(),
        );

        let data = rgb
            .data
            .chunks_exact(3)
            .flat_map(|px| ops.apply([px[0] as f32 / max, px[1] as f32 / max, px[2] as f32 / max]))
            .collect();

        Ok(ColorImage { width: rgb.width, height: rgb.height, data })
    }
}

/// Subtracts `flare` and scales each CFA site by its channel's gain.
///
/// Results saturate to the 16-bit sample range.
fn white_balance(raw: &RawFrame, pattern: CfaPattern, flare: f32, gains: [f32; 3]) -> RawFrame {
    let mut out = raw.clone();
    let Some(masks) = pattern.masks() else {
        return out;
    };
    for channel in Channel::ALL {
        let gain = gains[channel as usize];
        for &(tile_row, tile_col) in masks.positions(channel) {
            for row in (tile_row..raw.height).step_by(2) {
                for col in (tile_col..raw.width).step_by(2) {
                    let i = row * raw.width + col;
                    out.data[i] = ((raw.data[i] as f32 - flare) * gain) as u16;
                }
            }
        }
    }
    out
}

/// Steps 6 to 14, precomputed for one frame.
struct PixelOps {
    color_matrix: Matrix3,
    user_matrix: Option<Matrix3>,
    offset: f32,
    gains: [f32; 3],
    exponents: [f32; 3],
    tone: Option<ToneCurve>,
    pedestal: [f32; 3],
    chroma: ChromaAdjust,
}

impl PixelOps {
    fn new(
        color_matrix: Matrix3,
        user_matrix: Option<Matrix3>,
        adj: &ImageAdjustments,
        gamma: GammaMode,
        tone: ToneCurve,
    ) -> Self {
        let exponent = |g: f32| if g > 0.0 && g.is_finite() { 1.0 / g } else { 1.0 };
        let exponents = match gamma {
            GammaMode::Fixed(g) => [exponent(g); 3],
            GammaMode::FromSetup => [
                exponent(adj.gamma + adj.gamma_r),
                exponent(adj.gamma),
                exponent(adj.gamma + adj.gamma_b),
            ],
        };
        let tone = (!tone.is_identity()).then(|| tone.sorted());
        debug!(?exponents, tone_points = tone.as_ref().map_or(0, |t| t.points.len()), "pixel operations");

        Self {
            color_matrix,
            user_matrix,
            offset: adj.offset,
            gains: adj.gain_rgb.map(|g| g * adj.gain),
            exponents,
            tone,
            pedestal: adj.pedestal_rgb,
            chroma: ChromaAdjust::new(adj.chroma, adj.hue),
        }
    }

    #[inline]
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut v = mul_vec(&self.color_matrix, rgb);
        if let Some(user) = &self.user_matrix {
            v = mul_vec(user, v);
        }
        for c in 0..3 {
            let mut x = (v[c] + self.offset) * self.gains[c];
            x = x.max(0.0).powf(self.exponents[c]);
            if let Some(tone) = &self.tone {
                x = tone.eval(x);
            }
            let p = self.pedestal[c];
            v[c] = p + x * (1.0 - p);
        }
        let v = if self.chroma.is_identity() {
            v
        } else {
            ycbcr_to_rgb(self.chroma.apply(rgb_to_ycbcr(v)))
        };
        v.map(|x| x.clamp(0.0, 1.0))
    }
}
