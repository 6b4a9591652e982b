//! CINE container parsing module
//!
//! Fixed header structures, the revision-dependent setup record, the tagged
//! metadata region and the frame offset table, plus header-only rewriting.

mod header;
mod parser;
pub mod setup;
mod tagged;
mod tone;
mod types;
mod writer;

pub use header::{BitmapInfo, CINE_MAGIC, Compression, ContainerHeader, Time64};
pub use parser::{parse_header, read_chd_header, read_header};
pub use setup::{ImageAdjustments, Matrix3, Rect, Setup, WbGain};
pub use tagged::{TAG_EXPOSURE_ONLY, TAG_TIME_ONLY, TaggedBlocks, scan_tagged_blocks};
pub use tone::{MAX_TONE_POINTS, ToneCurve};
pub use types::{ChdHeader, Header};
pub use writer::{backup_header, write_header};

/// Oldest camera software whose setup layout carries the editable fields.
pub const MIN_EDITABLE_SOFTWARE_VERSION: u32 = 709;

/// Fails when the file was written by camera software older than `version`.
pub fn ensure_software_version(header: &Header, version: u32) -> crate::image_pipeline::Result<()> {
    let found = header.setup.software_version();
    if found < version {
        return Err(crate::image_pipeline::CineError::UnsupportedFormat(format!(
            "camera software version {found} is older than {version}"
        )));
    }
    Ok(())
}
