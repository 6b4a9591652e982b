//! Sensor color-filter layouts.
//!
//! Channel membership is derived once from the 2x2 tile and kept as static
//! lookup tables shared by white balance and defect correction.

use crate::image_pipeline::common::error::{CineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaPattern {
    Monochrome,
    Gbrg,
    Rggb,
}

/// Positions `(row, col)` inside the 2x2 tile that belong to each channel.
#[derive(Debug, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: &'static [(usize, usize)],
    pub green: &'static [(usize, usize)],
    pub blue: &'static [(usize, usize)],
}

impl ChannelMasks {
    pub fn positions(&self, channel: Channel) -> &'static [(usize, usize)] {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }
}

static RGGB_MASKS: ChannelMasks =
    ChannelMasks { red: &[(0, 0)], green: &[(0, 1), (1, 0)], blue: &[(1, 1)] };

static GBRG_MASKS: ChannelMasks =
    ChannelMasks { red: &[(1, 0)], green: &[(0, 0), (1, 1)], blue: &[(0, 1)] };

impl CfaPattern {
    /// Maps the setup `CFA` code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(CfaPattern::Monochrome),
            3 => Ok(CfaPattern::Gbrg),
            4 => Ok(CfaPattern::Rggb),
            other => Err(CineError::UnsupportedFormat(format!("CFA code {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CfaPattern::Monochrome => "mono",
            CfaPattern::Gbrg => "gbrg",
            CfaPattern::Rggb => "rggb",
        }
    }

    pub fn is_color(&self) -> bool {
        !matches!(self, CfaPattern::Monochrome)
    }

    /// Channels of the 2x2 tile in row-major order.
    pub fn tile(&self) -> Option<[Channel; 4]> {
        use Channel::*;
        match self {
            CfaPattern::Monochrome => None,
            CfaPattern::Gbrg => Some([Green, Blue, Red, Green]),
            CfaPattern::Rggb => Some([Red, Green, Green, Blue]),
        }
    }

    pub fn masks(&self) -> Option<&'static ChannelMasks> {
        match self {
            CfaPattern::Monochrome => None,
            CfaPattern::Gbrg => Some(&GBRG_MASKS),
            CfaPattern::Rggb => Some(&RGGB_MASKS),
        }
    }

    /// Channel of the sample at `(row, col)`; `None` for monochrome sensors.
    #[inline]
    pub fn channel_at(&self, row: usize, col: usize) -> Option<Channel> {
        self.tile().map(|t| t[(row & 1) * 2 + (col & 1)])
    }

    /// Whether two sample positions sit under the same filter color.
    #[inline]
    pub fn same_channel(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        self.channel_at(a.0, a.1) == self.channel_at(b.0, b.1)
    }

    pub fn to_bayer(&self) -> Option<bayer::CFA> {
        match self {
            CfaPattern::Monochrome => None,
            CfaPattern::Gbrg => Some(bayer::CFA::GBRG),
            CfaPattern::Rggb => Some(bayer::CFA::RGGB),
        }
    }
}
