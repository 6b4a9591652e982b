//! Pipeline conversions module
//!
//! Orchestration of CINE frame export: decode, color, encode, with per-step timings.

mod cine_to_tiff;
mod timing;

pub use cine_to_tiff::{CineToTiffPipeline, ExportSummary, frame_file_name};
pub use timing::{PipelineTimings, StepTiming, Timer};
