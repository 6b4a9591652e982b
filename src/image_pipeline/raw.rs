//! RAW frame reading module
//!
//! Frame record retrieval, payload unpacking, linearization and level
//! rescaling for the three supported pixel encodings.

mod cine_decoder;
mod defects;
mod frame_reader;
mod levels;
pub mod lut;
mod reader;
pub mod types;
pub mod unpack;

pub use cine_decoder::CineFrameDecoder;
pub use defects::correct_defects;
pub use frame_reader::{FrameReader, Frames, IntoFrames};
pub use levels::{LevelMapper, P10_LEVELS, P10_OUTPUT_BITS, linearize_p10};
pub use reader::RawImageReader;
pub use types::{DecodeOptions, DecodeOptionsBuilder, FrameRecord, P10Rescale, RawFrame};
