//! TIFF conversion configuration types

use crate::image_pipeline::color::ColorConfig;
use crate::image_pipeline::raw::types::DecodeOptions;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// Configuration for CINE frame to TIFF conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    /// Note: Predictor adds processing time, set to None for maximum speed
    pub predictor: Option<u16>,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
    /// Run the color pipeline and write RGB (true) or write the grayscale CFA grid (false)
    pub debayer: bool,
    /// Bit depth of RGB output samples
    pub output_bits: u32,
    pub decode: DecodeOptions,
    pub color: ColorConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            debayer: true,
            output_bits: 16,
            decode: DecodeOptions::default(),
            color: ColorConfig::default(),
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    debayer: Option<bool>,
    output_bits: Option<u32>,
    decode: Option<DecodeOptions>,
    color: Option<ColorConfig>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn debayer(mut self, enable: bool) -> Self {
        self.debayer = Some(enable);
        self
    }

    pub fn output_bits(mut self, bits: u32) -> Self {
        self.output_bits = Some(bits);
        self
    }

    pub fn decode(mut self, options: DecodeOptions) -> Self {
        self.decode = Some(options);
        self
    }

    pub fn color(mut self, config: ColorConfig) -> Self {
        self.color = Some(config);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            debayer: self.debayer.unwrap_or(default.debayer),
            output_bits: self.output_bits.unwrap_or(default.output_bits),
            decode: self.decode.unwrap_or(default.decode),
            color: self.color.unwrap_or(default.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConversionConfig::builder()
            .compression(TiffCompression::DeflateFast)
            .predictor(Some(2))
            .validate_dimensions(false)
            .debayer(false)
            .output_bits(12)
            .build();

        assert_eq!(config.compression, TiffCompression::DeflateFast);
        assert_eq!(config.predictor, Some(2));
        assert!(!config.validate_dimensions);
        assert!(!config.debayer);
        assert_eq!(config.output_bits, 12);
        assert!(!config.decode.defect_correction);
    }
}
