//! The SETUP record: camera settings and calibration data.
//!
//! The record grew over camera software revisions and declares its own size in
//! `Length`, so it is kept as the raw bytes read from disk with typed
//! accessors on top. Fields that lie beyond the declared length read as their
//! neutral default and cannot be edited.

use crate::image_pipeline::cine::tone::{MAX_TONE_POINTS, ToneCurve};
use crate::image_pipeline::common::error::{CineError, Result};

/// Byte offsets of the fields this crate reads or edits.
pub mod offsets {
    pub const MARK: usize = 140;
    pub const LENGTH: usize = 142;
    pub const IM_WIDTH: usize = 737;
    pub const IM_HEIGHT: usize = 739;
    pub const SERIAL: usize = 743;
    pub const FRAME_RATE: usize = 768;
    pub const SHUTTER: usize = 772;
    pub const SOFTWARE_VERSION: usize = 800;
    pub const CFA: usize = 808;
    pub const WB_GAIN: usize = 852;
    pub const WB_VIEW: usize = 888;
    pub const REAL_BPP: usize = 896;
    pub const BLACK_LEVEL: usize = 5732;
    pub const WHITE_LEVEL: usize = 5736;
    pub const F_OFFSET: usize = 6008;
    pub const F_GAIN: usize = 6012;
    pub const F_SATURATION: usize = 6016;
    pub const F_HUE: usize = 6020;
    pub const F_GAMMA: usize = 6024;
    pub const F_GAMMA_R: usize = 6028;
    pub const F_GAMMA_B: usize = 6032;
    pub const F_FLARE: usize = 6036;
    pub const F_PEDESTAL_R: usize = 6040;
    pub const F_CHROMA: usize = 6052;
    pub const TONE_LABEL: usize = 6056;
    pub const TONE_POINTS: usize = 6312;
    pub const F_TONE: usize = 6316;
    pub const USER_MATRIX_LABEL: usize = 6572;
    pub const ENABLE_MATRICES: usize = 6828;
    pub const CM_USER: usize = 6832;
    pub const ENABLE_CROP: usize = 6868;
    pub const CROP_RECT: usize = 6872;
    pub const ENABLE_RESAMPLE: usize = 6888;
    pub const RESAMPLE_WIDTH: usize = 6892;
    pub const RESAMPLE_HEIGHT: usize = 6896;
    pub const F_PB_RATE: usize = 6976;
    pub const F_TC_RATE: usize = 6980;
    pub const CINE_NAME: usize = 6984;
    pub const F_GAIN_R: usize = 7240;
    pub const CM_CALIB: usize = 7252;
    pub const F_WB_TEMP: usize = 7288;
    pub const F_WB_CC: usize = 7292;
    pub const CALIBRATION_INFO: usize = 7296;
    pub const OPTICAL_FILTER: usize = 8320;
    pub const CREATED_BY: usize = 9856;
    pub const CAMERA_MODEL: usize = 10132;
    /// End of the last field described above.
    pub const KNOWN_END: usize = 10388;
}

pub const LABEL_LEN: usize = 256;
pub const INFO_LEN: usize = 1024;

/// Smallest record that still carries its own `Length` field.
pub const MIN_SETUP_LEN: usize = offsets::LENGTH + 2;

pub type Matrix3 = [[f32; 3]; 3];

/// Red/blue gain pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WbGain {
    pub r: f32,
    pub b: f32,
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Scalar image controls applied after the color matrices.
///
/// Absent or zero gains read as 1, absent chroma as 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageAdjustments {
    pub offset: f32,
    pub gain: f32,
    pub gain_rgb: [f32; 3],
    pub gamma: f32,
    pub gamma_r: f32,
    pub gamma_b: f32,
    pub flare: f32,
    pub pedestal_rgb: [f32; 3],
    pub chroma: f32,
    /// Degrees.
    pub hue: f32,
    pub saturation: f32,
}

impl Default for ImageAdjustments {
    fn default() -> Self {
        Self {
            offset: 0.0,
            gain: 1.0,
            gain_rgb: [1.0; 3],
            gamma: 1.0,
            gamma_r: 0.0,
            gamma_b: 0.0,
            flare: 0.0,
            pedestal_rgb: [0.0; 3],
            chroma: 1.0,
            hue: 0.0,
            saturation: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    bytes: Vec<u8>,
}

impl Setup {
    /// Wraps a record read from disk. The slice must be exactly `Length` bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SETUP_LEN {
            return Err(CineError::Format(format!(
                "setup record of {} bytes is too short",
                bytes.len()
            )));
        }
        let setup = Self { bytes };
        let declared = setup.length() as usize;
        if declared != setup.bytes.len() {
            return Err(CineError::Format(format!(
                "setup declares {declared} bytes but {} were provided",
                setup.bytes.len()
            )));
        }
        Ok(setup)
    }

    /// A zeroed record of `length` bytes with `Mark` and `Length` filled in.
    pub fn with_length(length: u16) -> Result<Self> {
        let len = length as usize;
        if len < MIN_SETUP_LEN {
            return Err(CineError::Format(format!("setup length {len} is too short")));
        }
        Ok(Self::zeroed(length))
    }

    fn zeroed(length: u16) -> Self {
        let mut bytes = vec![0u8; length as usize];
        bytes[offsets::MARK..offsets::MARK + 2].copy_from_slice(b"ST");
        bytes[offsets::LENGTH..offsets::LENGTH + 2].copy_from_slice(&length.to_le_bytes());
        Self { bytes }
    }

    /// A record large enough to hold every field this crate knows about.
    pub fn full() -> Self {
        let mut setup = Self::zeroed(offsets::KNOWN_END as u16);
        let written = setup.write_neutral_gains();
        debug_assert!(written.is_ok(), "neutral gains lie beyond KNOWN_END: {written:?}");
        setup
    }

    fn write_neutral_gains(&mut self) -> Result<()> {
        let defaults = ImageAdjustments::default();
        self.set_f32(offsets::F_GAIN, defaults.gain)?;
        self.set_f32_array(offsets::F_GAIN_R, &defaults.gain_rgb)?;
        self.set_f32(offsets::F_CHROMA, defaults.chroma)?;
        self.set_f32(offsets::F_GAMMA, defaults.gamma)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared record size in bytes.
    pub fn length(&self) -> u16 {
        u16::from_le_bytes([self.bytes[offsets::LENGTH], self.bytes[offsets::LENGTH + 1]])
    }

    pub fn has_field(&self, offset: usize, size: usize) -> bool {
        offset + size <= self.bytes.len()
    }

    fn raw<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.bytes.get(offset..offset + N)?.try_into().ok()
    }

    fn u16_at(&self, offset: usize) -> u16 {
        self.raw(offset).map(u16::from_le_bytes).unwrap_or_default()
    }

    fn u32_at(&self, offset: usize) -> u32 {
        self.raw(offset).map(u32::from_le_bytes).unwrap_or_default()
    }

    fn i32_at(&self, offset: usize) -> i32 {
        self.raw(offset).map(i32::from_le_bytes).unwrap_or_default()
    }

    fn f32_opt(&self, offset: usize) -> Option<f32> {
        self.raw(offset).map(f32::from_le_bytes)
    }

    fn f32_at(&self, offset: usize) -> f32 {
        self.f32_opt(offset).unwrap_or_default()
    }

    fn bool_at(&self, offset: usize) -> bool {
        self.i32_at(offset) != 0
    }

    fn matrix_at(&self, offset: usize) -> Matrix3 {
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.f32_at(offset + (i * 3 + j) * 4);
            }
        }
        m
    }

    fn str_at(&self, offset: usize, len: usize) -> String {
        let Some(raw) = self.bytes.get(offset..offset + len) else {
            return String::new();
        };
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    fn put(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let len = self.bytes.len();
        let slot = self.bytes.get_mut(offset..offset + data.len()).ok_or_else(|| {
            CineError::Format(format!(
                "field at byte {offset} lies beyond this file's {len}-byte setup record"
            ))
        })?;
        slot.copy_from_slice(data);
        Ok(())
    }

    fn set_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        self.put(offset, &value.to_le_bytes())
    }

    fn set_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        self.put(offset, &value.to_le_bytes())
    }

    fn set_f32(&mut self, offset: usize, value: f32) -> Result<()> {
        self.put(offset, &value.to_le_bytes())
    }

    fn set_f32_array(&mut self, offset: usize, values: &[f32]) -> Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.put(offset, &bytes)
    }

    fn set_str(&mut self, offset: usize, len: usize, value: &str) -> Result<()> {
        if !value.is_ascii() || value.len() >= len {
            return Err(CineError::Format(format!(
                "'{value}' must be ASCII and shorter than {len} bytes"
            )));
        }
        let mut field = vec![0u8; len];
        field[..value.len()].copy_from_slice(value.as_bytes());
        self.put(offset, &field)
    }

    fn copy_range(&mut self, other: &Setup, offset: usize, size: usize) -> Result<()> {
        let src = other.bytes.get(offset..offset + size).ok_or_else(|| {
            CineError::Format(format!("source setup has no field at byte {offset}"))
        })?;
        let src = src.to_vec();
        self.put(offset, &src)
    }

    pub fn image_width(&self) -> u16 {
        self.u16_at(offsets::IM_WIDTH)
    }

    pub fn image_height(&self) -> u16 {
        self.u16_at(offsets::IM_HEIGHT)
    }

    pub fn serial(&self) -> u32 {
        self.u32_at(offsets::SERIAL)
    }

    /// Record rate in frames per second.
    pub fn frame_rate(&self) -> u32 {
        self.u32_at(offsets::FRAME_RATE)
    }

    pub fn set_frame_rate(&mut self, fps: u32) -> Result<()> {
        self.set_u32(offsets::FRAME_RATE, fps)
    }

    /// Exposure in microseconds.
    pub fn shutter(&self) -> u32 {
        self.u32_at(offsets::SHUTTER)
    }

    pub fn software_version(&self) -> u32 {
        self.u32_at(offsets::SOFTWARE_VERSION)
    }

    /// Sensor color-filter code: 0 monochrome, 3 GBRG, 4 RGGB.
    pub fn cfa(&self) -> u32 {
        self.u32_at(offsets::CFA)
    }

    pub fn set_cfa(&mut self, code: u32) -> Result<()> {
        self.set_u32(offsets::CFA, code)
    }

    pub fn wb_gains(&self) -> [WbGain; 4] {
        std::array::from_fn(|i| WbGain {
            r: self.f32_at(offsets::WB_GAIN + i * 8),
            b: self.f32_at(offsets::WB_GAIN + i * 8 + 4),
        })
    }

    pub fn wb_view(&self) -> WbGain {
        WbGain { r: self.f32_at(offsets::WB_VIEW), b: self.f32_at(offsets::WB_VIEW + 4) }
    }

    pub fn real_bpp(&self) -> u32 {
        self.u32_at(offsets::REAL_BPP)
    }

    pub fn set_real_bpp(&mut self, bpp: u32) -> Result<()> {
        self.set_u32(offsets::REAL_BPP, bpp)
    }

    pub fn black_level(&self) -> i32 {
        self.i32_at(offsets::BLACK_LEVEL)
    }

    pub fn white_level(&self) -> i32 {
        self.i32_at(offsets::WHITE_LEVEL)
    }

    pub fn set_levels(&mut self, black: i32, white: i32) -> Result<()> {
        self.set_i32(offsets::BLACK_LEVEL, black)?;
        self.set_i32(offsets::WHITE_LEVEL, white)
    }

    pub fn adjustments(&self) -> ImageAdjustments {
        let defaults = ImageAdjustments::default();
        let gain_or_one = |offset| match self.f32_opt(offset) {
            Some(g) if g > 0.0 && g.is_finite() => g,
            _ => 1.0,
        };
        ImageAdjustments {
            offset: self.f32_at(offsets::F_OFFSET),
            gain: gain_or_one(offsets::F_GAIN),
            gain_rgb: std::array::from_fn(|i| gain_or_one(offsets::F_GAIN_R + i * 4)),
            gamma: self.f32_opt(offsets::F_GAMMA).unwrap_or(defaults.gamma),
            gamma_r: self.f32_at(offsets::F_GAMMA_R),
            gamma_b: self.f32_at(offsets::F_GAMMA_B),
            flare: self.f32_at(offsets::F_FLARE),
            pedestal_rgb: std::array::from_fn(|i| self.f32_at(offsets::F_PEDESTAL_R + i * 4)),
            chroma: gain_or_one(offsets::F_CHROMA),
            hue: self.f32_at(offsets::F_HUE),
            saturation: gain_or_one(offsets::F_SATURATION),
        }
    }

    pub fn set_adjustments(&mut self, adj: &ImageAdjustments) -> Result<()> {
        self.set_f32(offsets::F_OFFSET, adj.offset)?;
        self.set_f32(offsets::F_GAIN, adj.gain)?;
        self.set_f32(offsets::F_SATURATION, adj.saturation)?;
        self.set_f32(offsets::F_HUE, adj.hue)?;
        self.set_f32(offsets::F_GAMMA, adj.gamma)?;
        self.set_f32(offsets::F_GAMMA_R, adj.gamma_r)?;
        self.set_f32(offsets::F_GAMMA_B, adj.gamma_b)?;
        self.set_f32(offsets::F_FLARE, adj.flare)?;
        self.set_f32_array(offsets::F_PEDESTAL_R, &adj.pedestal_rgb)?;
        self.set_f32(offsets::F_CHROMA, adj.chroma)?;
        self.set_f32_array(offsets::F_GAIN_R, &adj.gain_rgb)
    }

    pub fn tone_label(&self) -> String {
        self.str_at(offsets::TONE_LABEL, LABEL_LEN)
    }

    pub fn tone_points(&self) -> u32 {
        self.u32_at(offsets::TONE_POINTS)
    }

    pub fn tone_curve(&self) -> ToneCurve {
        let count = (self.tone_points() as usize).min(MAX_TONE_POINTS);
        let points = (0..count)
            .map(|i| {
                let base = offsets::F_TONE + i * 8;
                (self.f32_at(base), self.f32_at(base + 4))
            })
            .collect();
        ToneCurve { label: self.tone_label(), points }
    }

    pub fn set_tone_curve(&mut self, curve: &ToneCurve) -> Result<()> {
        if curve.points.len() > MAX_TONE_POINTS {
            return Err(CineError::Format(format!(
                "tone curve has {} points, at most {MAX_TONE_POINTS} allowed",
                curve.points.len()
            )));
        }
        let mut values = [0.0f32; MAX_TONE_POINTS * 2];
        for (i, (x, y)) in curve.points.iter().enumerate() {
            values[i * 2] = *x;
            values[i * 2 + 1] = *y;
        }
        self.set_str(offsets::TONE_LABEL, LABEL_LEN, &curve.label)?;
        self.set_u32(offsets::TONE_POINTS, curve.points.len() as u32)?;
        self.set_f32_array(offsets::F_TONE, &values)
    }

    pub fn user_matrix_label(&self) -> String {
        self.str_at(offsets::USER_MATRIX_LABEL, LABEL_LEN)
    }

    pub fn matrices_enabled(&self) -> bool {
        self.bool_at(offsets::ENABLE_MATRICES)
    }

    pub fn user_matrix(&self) -> Matrix3 {
        self.matrix_at(offsets::CM_USER)
    }

    pub fn set_user_matrix(&mut self, matrix: &Matrix3, enabled: bool) -> Result<()> {
        self.set_f32_array(offsets::CM_USER, matrix.as_flattened())?;
        self.set_i32(offsets::ENABLE_MATRICES, enabled as i32)
    }

    pub fn crop_enabled(&self) -> bool {
        self.bool_at(offsets::ENABLE_CROP)
    }

    pub fn crop_rect(&self) -> Rect {
        Rect {
            left: self.i32_at(offsets::CROP_RECT),
            top: self.i32_at(offsets::CROP_RECT + 4),
            right: self.i32_at(offsets::CROP_RECT + 8),
            bottom: self.i32_at(offsets::CROP_RECT + 12),
        }
    }

    pub fn set_crop(&mut self, rect: Option<Rect>) -> Result<()> {
        let rect_value = rect.unwrap_or_default();
        self.set_i32(offsets::ENABLE_CROP, rect.is_some() as i32)?;
        self.set_i32(offsets::CROP_RECT, rect_value.left)?;
        self.set_i32(offsets::CROP_RECT + 4, rect_value.top)?;
        self.set_i32(offsets::CROP_RECT + 8, rect_value.right)?;
        self.set_i32(offsets::CROP_RECT + 12, rect_value.bottom)
    }

    pub fn resample_enabled(&self) -> bool {
        self.bool_at(offsets::ENABLE_RESAMPLE)
    }

    pub fn resample_size(&self) -> (u32, u32) {
        (self.u32_at(offsets::RESAMPLE_WIDTH), self.u32_at(offsets::RESAMPLE_HEIGHT))
    }

    pub fn set_resample(&mut self, size: Option<(u32, u32)>) -> Result<()> {
        let (w, h) = size.unwrap_or_default();
        self.set_i32(offsets::ENABLE_RESAMPLE, size.is_some() as i32)?;
        self.set_u32(offsets::RESAMPLE_WIDTH, w)?;
        self.set_u32(offsets::RESAMPLE_HEIGHT, h)
    }

    pub fn playback_rate(&self) -> f32 {
        self.f32_at(offsets::F_PB_RATE)
    }

    pub fn set_playback_rate(&mut self, fps: f32) -> Result<()> {
        self.set_f32(offsets::F_PB_RATE, fps)
    }

    pub fn timecode_rate(&self) -> f32 {
        self.f32_at(offsets::F_TC_RATE)
    }

    pub fn set_timecode_rate(&mut self, fps: f32) -> Result<()> {
        self.set_f32(offsets::F_TC_RATE, fps)
    }

    pub fn cine_name(&self) -> String {
        self.str_at(offsets::CINE_NAME, LABEL_LEN)
    }

    /// The combined white-balance and color-correction matrix.
    pub fn calib_matrix(&self) -> Matrix3 {
        self.matrix_at(offsets::CM_CALIB)
    }

    pub fn set_calib_matrix(&mut self, matrix: &Matrix3) -> Result<()> {
        self.set_f32_array(offsets::CM_CALIB, matrix.as_flattened())
    }

    pub fn wb_temp(&self) -> f32 {
        self.f32_at(offsets::F_WB_TEMP)
    }

    /// Sets the color temperature label only; the calibration matrix is unchanged.
    pub fn set_wb_temp(&mut self, kelvin: f32) -> Result<()> {
        self.set_f32(offsets::F_WB_TEMP, kelvin)
    }

    pub fn wb_cc(&self) -> f32 {
        self.f32_at(offsets::F_WB_CC)
    }

    /// Sets the color-correction label only; the calibration matrix is unchanged.
    pub fn set_wb_cc(&mut self, cc: f32) -> Result<()> {
        self.set_f32(offsets::F_WB_CC, cc)
    }

    pub fn calibration_info(&self) -> String {
        self.str_at(offsets::CALIBRATION_INFO, INFO_LEN)
    }

    pub fn optical_filter(&self) -> String {
        self.str_at(offsets::OPTICAL_FILTER, INFO_LEN)
    }

    pub fn created_by(&self) -> String {
        self.str_at(offsets::CREATED_BY, LABEL_LEN)
    }

    pub fn camera_model(&self) -> String {
        self.str_at(offsets::CAMERA_MODEL, LABEL_LEN)
    }

    /// Copies temperature, cc, calibration matrix and WB gains from `other`.
    pub fn copy_white_balance_from(&mut self, other: &Setup) -> Result<()> {
        self.copy_range(other, offsets::F_WB_TEMP, 8)?;
        self.copy_range(other, offsets::CM_CALIB, 36)?;
        self.copy_range(other, offsets::WB_GAIN, 32)
    }

    /// Copies the tone label, point count and points from `other`.
    pub fn copy_tone_from(&mut self, other: &Setup) -> Result<()> {
        self.copy_range(other, offsets::TONE_LABEL, offsets::USER_MATRIX_LABEL - offsets::TONE_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_checks_declared_length() {
        let setup = Setup::with_length(200).unwrap();
        let mut bytes = setup.as_bytes().to_vec();
        assert!(Setup::from_bytes(bytes.clone()).is_ok());

        bytes.push(0);
        assert!(matches!(Setup::from_bytes(bytes), Err(CineError::Format(_))));
        assert!(Setup::from_bytes(vec![0u8; 10]).is_err());
    }

    #[test]
    fn test_fields_beyond_length_read_as_defaults() {
        let mut setup = Setup::with_length(1000).unwrap();
        setup.set_cfa(4).unwrap();
        setup.set_real_bpp(12).unwrap();
        assert_eq!(setup.cfa(), 4);
        assert_eq!(setup.real_bpp(), 12);
        assert_eq!(setup.white_level(), 0);
        assert_eq!(setup.adjustments(), ImageAdjustments::default());
        assert!(setup.set_levels(64, 4064).is_err());
    }

    #[test]
    fn test_full_setup_stores_neutral_gains() {
        let mut setup = Setup::full();
        assert_eq!(setup.length() as usize, offsets::KNOWN_END);
        assert_eq!(setup.f32_opt(offsets::F_GAIN), Some(1.0));
        assert_eq!(setup.f32_opt(offsets::F_GAIN_R + 8), Some(1.0));
        assert_eq!(setup.f32_opt(offsets::F_CHROMA), Some(1.0));
        assert_eq!(setup.f32_opt(offsets::F_GAMMA), Some(1.0));
        assert!(setup.write_neutral_gains().is_ok());

        let mut short = Setup::with_length(1000).unwrap();
        assert!(matches!(short.write_neutral_gains(), Err(CineError::Format(_))));
    }

    #[test]
    fn test_scalar_setters() {
        let mut setup = Setup::full();
        setup.set_levels(64, 4064).unwrap();
        setup.set_frame_rate(1000).unwrap();
        setup.set_playback_rate(24.0).unwrap();
        setup.set_timecode_rate(25.0).unwrap();
        setup.set_wb_temp(5600.0).unwrap();
        setup.set_wb_cc(-2.0).unwrap();
        assert_eq!((setup.black_level(), setup.white_level()), (64, 4064));
        assert_eq!(setup.frame_rate(), 1000);
        assert_eq!(setup.playback_rate(), 24.0);
        assert_eq!(setup.timecode_rate(), 25.0);
        assert_eq!(setup.wb_temp(), 5600.0);
        assert_eq!(setup.wb_cc(), -2.0);
        assert_eq!(setup.length() as usize, offsets::KNOWN_END);
    }

    #[test]
    fn test_tone_curve_round_trip() {
        let mut setup = Setup::full();
        let curve = ToneCurve::parse("FILM 0 0 0.5 0.6 1 1").unwrap();
        setup.set_tone_curve(&curve).unwrap();
        assert_eq!(setup.tone_points(), 3);
        assert_eq!(setup.tone_label(), "FILM");
        assert_eq!(setup.tone_curve(), curve);
    }

    #[test]
    fn test_label_must_fit() {
        let mut setup = Setup::full();
        let curve = ToneCurve { label: "x".repeat(LABEL_LEN), points: vec![] };
        assert!(setup.set_tone_curve(&curve).is_err());
    }

    #[test]
    fn test_matrices_and_rects() {
        let mut setup = Setup::full();
        let m = [[1.5, -0.3, -0.2], [-0.1, 1.2, -0.1], [0.0, -0.4, 1.4]];
        setup.set_calib_matrix(&m).unwrap();
        setup.set_user_matrix(&m, true).unwrap();
        setup.set_crop(Some(Rect { left: 1, top: 2, right: 3, bottom: 4 })).unwrap();
        setup.set_resample(Some((320, 240))).unwrap();
        assert_eq!(setup.calib_matrix(), m);
        assert_eq!(setup.user_matrix(), m);
        assert!(setup.matrices_enabled());
        assert!(setup.crop_enabled());
        assert_eq!(setup.crop_rect().bottom, 4);
        assert!(setup.resample_enabled());
        assert_eq!(setup.resample_size(), (320, 240));
    }

    #[test]
    fn test_copy_white_balance_and_tone() {
        let mut source = Setup::full();
        source.set_wb_temp(3200.0).unwrap();
        source.set_calib_matrix(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 3.0]]).unwrap();
        source.set_tone_curve(&ToneCurve::parse("T 0 0.1 1 0.9").unwrap()).unwrap();

        let mut dest = Setup::full();
        dest.copy_white_balance_from(&source).unwrap();
        dest.copy_tone_from(&source).unwrap();
        assert_eq!(dest.wb_temp(), 3200.0);
        assert_eq!(dest.calib_matrix(), source.calib_matrix());
        assert_eq!(dest.tone_curve(), source.tone_curve());
        assert!(!dest.matrices_enabled());
    }

    #[test]
    fn test_zero_gains_read_as_neutral() {
        let mut setup = Setup::full();
        let adj = ImageAdjustments { gain: 0.0, chroma: 0.0, ..Default::default() };
        setup.set_adjustments(&adj).unwrap();
        let read = setup.adjustments();
        assert_eq!(read.gain, 1.0);
        assert_eq!(read.chroma, 1.0);
    }

    #[test]
    fn test_strings_stop_at_nul() {
        let setup = Setup::full();
        assert_eq!(setup.created_by(), "");
        assert_eq!(setup.calibration_info(), "");
    }
}
