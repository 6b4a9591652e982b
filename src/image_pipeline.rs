//! CINE decoding pipeline module
//!
//! Header parsing and rewriting, frame decoding, color processing and TIFF
//! export, with one module per concern.

pub mod cine;
pub mod color;
pub mod common;
pub mod conversions;
pub mod debayer;
pub mod raw;
pub mod tiff;

mod api;
#[cfg(test)]
pub(crate) mod testing;

pub use api::{FrameIter, bits_per_pixel, frame_count, iterate_frames, read_frame};

pub use common::{CfaPattern, CineError, Result};

pub use cine::{Header, Setup, read_header, write_header};

pub use raw::{CineFrameDecoder, DecodeOptions, FrameReader, P10Rescale, RawFrame, RawImageReader};

pub use color::{ColorConfig, ColorImage, ColorPipeline, GammaMode, MatrixNormalization, apply_color_pipeline};

pub use self::tiff::{ConversionConfig, ConversionConfigBuilder, StandardTiffWriter, TiffCompression, TiffWriter};

pub use conversions::{CineToTiffPipeline, ExportSummary, PipelineTimings};
