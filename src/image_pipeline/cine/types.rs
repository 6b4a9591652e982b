//! The parsed header aggregate.

use crate::image_pipeline::cine::header::{BitmapInfo, Compression, ContainerHeader};
use crate::image_pipeline::cine::setup::Setup;
use crate::image_pipeline::cine::tagged::TaggedBlocks;
use crate::image_pipeline::common::error::{CineError, Result};

/// Everything read from a CINE file before its frames.
///
/// Built once when a file is opened. Only `setup` (and the fixed structures)
/// should be edited afterwards, and only to be written back with `write_header`.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub container: ContainerHeader,
    pub bitmap: BitmapInfo,
    pub setup: Setup,
    /// Absolute byte offset of each stored frame record.
    pub offsets: Vec<i64>,
    pub tagged: TaggedBlocks,
}

impl Header {
    pub fn frame_count(&self) -> u32 {
        self.container.image_count
    }

    /// Bit depth of decoded frames.
    ///
    /// The 10-bit packed format decodes into a 12-bit range; everything else
    /// into the sensor's `RealBPP`.
    pub fn bits_per_pixel(&self) -> u32 {
        match self.bitmap.compression() {
            Compression::Packed10 => 12,
            _ => self.setup.real_bpp(),
        }
    }

    pub fn width(&self) -> usize {
        self.bitmap.width()
    }

    pub fn height(&self) -> usize {
        self.bitmap.height()
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.offsets.len() {
            return Err(CineError::OutOfRange { index: index as i64, count: self.frame_count() });
        }
        Ok(())
    }

    /// Byte offset of the record for stored frame `index`.
    pub fn frame_offset(&self, index: usize) -> Result<u64> {
        self.check_index(index)?;
        Ok(self.offsets[index] as u64)
    }

    /// Converts a camera-relative frame number into a stored index.
    pub fn stored_index(&self, camera_frame: i64) -> Result<usize> {
        let index = camera_frame - self.container.first_image_no as i64;
        if index < 0 || index >= self.frame_count() as i64 {
            return Err(CineError::FrameNumberOutOfRange {
                frame: camera_frame,
                first: self.container.first_image_no,
                count: self.frame_count(),
            });
        }
        Ok(index as usize)
    }

    pub fn camera_frame_number(&self, index: usize) -> i64 {
        self.container.first_image_no as i64 + index as i64
    }

    /// Frame timestamp in seconds, when the file carries a time block.
    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.tagged.timestamps.as_ref()?.get(index).copied()
    }

    /// Exposure duration in seconds, when the file carries an exposure block.
    pub fn exposure(&self, index: usize) -> Option<f64> {
        self.tagged.exposures.as_ref()?.get(index).copied()
    }
}

/// The three fixed structures alone, as stored in companion header files.
#[derive(Debug, Clone, PartialEq)]
pub struct ChdHeader {
    pub container: ContainerHeader,
    pub bitmap: BitmapInfo,
    pub setup: Setup,
}
