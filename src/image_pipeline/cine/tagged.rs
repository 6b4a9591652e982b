//! Tagged metadata blocks between the setup record and the frame offset table.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace};

use crate::image_pipeline::common::error::{CineError, Result};

pub const TAG_TIME_ONLY: u16 = 1002;
pub const TAG_EXPOSURE_ONLY: u16 = 1003;

/// Size of `{u32 blockSize, u16 tagType, u16 reserved}`.
pub const BLOCK_HEADER_LEN: u64 = 8;

const FIXED_POINT_ONE: f64 = 4_294_967_296.0;

/// Per-frame arrays decoded from the tagged region, aligned with frame index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedBlocks {
    /// Seconds, from a time-only block.
    pub timestamps: Option<Vec<f64>>,
    /// Seconds, from an exposure-only block.
    pub exposures: Option<Vec<f64>>,
    /// Tags of blocks that were skipped without interpretation.
    pub skipped_tags: Vec<u16>,
}

impl TaggedBlocks {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_none() && self.exposures.is_none() && self.skipped_tags.is_empty()
    }
}

/// Scans `[start, end)` block by block.
///
/// Every block must advance the position and the last one must end exactly at `end`.
pub fn scan_tagged_blocks<R: Read + Seek>(
    r: &mut R,
    start: u64,
    end: u64,
    image_count: u32,
) -> Result<TaggedBlocks> {
    let mut blocks = TaggedBlocks::default();
    let mut position = start;
    r.seek(SeekFrom::Start(position))?;

    while position < end {
        if position + BLOCK_HEADER_LEN > end {
            return Err(CineError::Format(format!(
                "tagged block header at {position} runs past the offset table at {end}"
            )));
        }
        let (block_size, tag) = read_block_header(r)
            .map_err(|e| CineError::truncated("tagged block header", e))?;
        let block_size = block_size as u64;

        if block_size < BLOCK_HEADER_LEN {
            return Err(CineError::Format(format!(
                "tagged block at {position} declares size {block_size}, which cannot advance the scan"
            )));
        }
        if position + block_size > end {
            return Err(CineError::Format(format!(
                "tagged block at {position} of size {block_size} overshoots the offset table at {end}"
            )));
        }

        let payload_len = block_size - BLOCK_HEADER_LEN;
        trace!(position, block_size, tag, "tagged block");

        match tag {
            TAG_TIME_ONLY => {
                blocks.timestamps = Some(read_timestamps(r, payload_len, image_count)?);
            }
            TAG_EXPOSURE_ONLY => {
                blocks.exposures = Some(read_exposures(r, payload_len, image_count)?);
            }
            other => blocks.skipped_tags.push(other),
        }

        position += block_size;
        r.seek(SeekFrom::Start(position))?;
    }

    debug!(
        timestamps = blocks.timestamps.is_some(),
        exposures = blocks.exposures.is_some(),
        skipped = blocks.skipped_tags.len(),
        "tagged region scanned"
    );
    Ok(blocks)
}

fn read_block_header<R: Read>(r: &mut R) -> std::io::Result<(u32, u16)> {
    let block_size = r.read_u32::<LittleEndian>()?;
    let tag = r.read_u16::<LittleEndian>()?;
    let _reserved = r.read_u16::<LittleEndian>()?;
    Ok((block_size, tag))
}

fn ensure_payload(tag: u16, payload_len: u64, needed: u64) -> Result<()> {
    if payload_len < needed {
        return Err(CineError::Format(format!(
            "tagged block {tag} holds {payload_len} bytes, {needed} needed"
        )));
    }
    Ok(())
}

fn read_timestamps<R: Read>(r: &mut R, payload_len: u64, image_count: u32) -> Result<Vec<f64>> {
    ensure_payload(TAG_TIME_ONLY, payload_len, image_count as u64 * 8)?;
    (0..image_count)
        .map(|_| {
            let fractional = r.read_u32::<LittleEndian>()?;
            let integer = r.read_u32::<LittleEndian>()?;
            Ok(integer as f64 + fractional as f64 / FIXED_POINT_ONE)
        })
        .collect::<std::io::Result<Vec<f64>>>()
        .map_err(|e| CineError::truncated("time block", e))
}

fn read_exposures<R: Read>(r: &mut R, payload_len: u64, image_count: u32) -> Result<Vec<f64>> {
    ensure_payload(TAG_EXPOSURE_ONLY, payload_len, image_count as u64 * 4)?;
    (0..image_count)
        .map(|_| Ok(r.read_u32::<LittleEndian>()? as f64 / FIXED_POINT_ONE))
        .collect::<std::io::Result<Vec<f64>>>()
        .map_err(|e| CineError::truncated("exposure block", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn block(tag: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_time_and_exposure_blocks() {
        let mut time = Vec::new();
        for (frac, int) in [(0u32, 5u32), (1 << 31, 5)] {
            time.extend_from_slice(&frac.to_le_bytes());
            time.extend_from_slice(&int.to_le_bytes());
        }
        let mut exposure = Vec::new();
        for v in [1u32 << 22, 1 << 21] {
            exposure.extend_from_slice(&v.to_le_bytes());
        }

        let mut region = vec![0u8; 16];
        region.extend(block(TAG_TIME_ONLY, &time));
        region.extend(block(999, &[1, 2, 3, 4]));
        region.extend(block(TAG_EXPOSURE_ONLY, &exposure));
        let end = region.len() as u64;

        let blocks = scan_tagged_blocks(&mut Cursor::new(region), 16, end, 2).unwrap();
        assert_eq!(blocks.timestamps, Some(vec![5.0, 5.5]));
        let exposures = blocks.exposures.unwrap();
        assert!((exposures[0] - 2f64.powi(-10)).abs() < 1e-15);
        assert!((exposures[1] - 2f64.powi(-11)).abs() < 1e-15);
        assert_eq!(blocks.skipped_tags, vec![999]);
    }

    #[test]
    fn test_empty_region() {
        let blocks = scan_tagged_blocks(&mut Cursor::new(vec![0u8; 4]), 4, 4, 10).unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_zero_size_block_is_rejected() {
        let mut region = vec![0u8; 8];
        region.extend_from_slice(&[0u8; 16]);
        let result = scan_tagged_blocks(&mut Cursor::new(region), 8, 24, 1);
        assert!(matches!(result, Err(CineError::Format(msg)) if msg.contains("cannot advance")));
    }

    #[test]
    fn test_overshoot_is_rejected() {
        let mut region = block(7, &[0u8; 8]);
        region.extend_from_slice(&[0u8; 8]);
        // The block spans 16 bytes but the offset table starts at 12.
        let result = scan_tagged_blocks(&mut Cursor::new(region), 0, 12, 1);
        assert!(matches!(result, Err(CineError::Format(msg)) if msg.contains("overshoots")));
    }

    #[test]
    fn test_short_time_block_is_rejected() {
        let region = block(TAG_TIME_ONLY, &[0u8; 8]);
        let end = region.len() as u64;
        let result = scan_tagged_blocks(&mut Cursor::new(region), 0, end, 3);
        assert!(matches!(result, Err(CineError::Format(_))));
    }
}
