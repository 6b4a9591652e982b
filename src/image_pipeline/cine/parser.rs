//! Reading the header structures, offset table and tagged region.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use crate::image_pipeline::cine::header::{BitmapInfo, CINE_MAGIC, ContainerHeader};
use crate::image_pipeline::cine::setup::{MIN_SETUP_LEN, Setup, offsets};
use crate::image_pipeline::cine::tagged::{TaggedBlocks, scan_tagged_blocks};
use crate::image_pipeline::cine::types::{ChdHeader, Header};
use crate::image_pipeline::common::error::{CineError, Result};

/// Reads the full header of a CINE file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<Header> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    parse_header(&mut reader)
}

/// Reads only the three fixed structures, as found in `.chd` companion files.
pub fn read_chd_header<P: AsRef<Path>>(path: P) -> Result<ChdHeader> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let (container, bitmap, setup) = read_fixed_structures(&mut reader)?;
    Ok(ChdHeader { container, bitmap, setup })
}

pub fn parse_header<R: Read + Seek>(r: &mut R) -> Result<Header> {
    let (container, bitmap, setup) = read_fixed_structures(r)?;
    let offsets = read_offset_table(r, &container)?;

    let tagged_start = container.off_setup as u64 + setup.length() as u64;
    let tagged_end = container.off_image_offsets as u64;
    let tagged = if tagged_start < tagged_end {
        scan_tagged_blocks(r, tagged_start, tagged_end, container.image_count)?
    } else {
        TaggedBlocks::default()
    };

    debug!(
        frames = container.image_count,
        width = bitmap.width,
        height = bitmap.height,
        compression = bitmap.compression,
        setup_len = setup.length(),
        "header parsed"
    );

    Ok(Header { container, bitmap, setup, offsets, tagged })
}

fn read_fixed_structures<R: Read + Seek>(
    r: &mut R,
) -> Result<(ContainerHeader, BitmapInfo, Setup)> {
    r.seek(SeekFrom::Start(0))?;
    let container = ContainerHeader::read_from(r)?;
    if container.file_type != CINE_MAGIC {
        warn!(file_type = container.file_type, "file does not start with the CI signature");
    }
    let bitmap = BitmapInfo::read_from(r)?;

    r.seek(SeekFrom::Start(container.off_setup as u64))?;
    let setup = read_setup(r)?;
    Ok((container, bitmap, setup))
}

/// Reads the setup record using the length it declares.
fn read_setup<R: Read>(r: &mut R) -> Result<Setup> {
    let mut bytes = vec![0u8; MIN_SETUP_LEN];
    r.read_exact(&mut bytes).map_err(|e| CineError::truncated("setup record", e))?;

    let declared =
        u16::from_le_bytes([bytes[offsets::LENGTH], bytes[offsets::LENGTH + 1]]) as usize;
    if declared < MIN_SETUP_LEN {
        return Err(CineError::Format(format!("setup declares an impossible length of {declared}")));
    }
    bytes.resize(declared, 0);
    r.read_exact(&mut bytes[MIN_SETUP_LEN..])
        .map_err(|e| CineError::truncated("setup record", e))?;
    Setup::from_bytes(bytes)
}

fn read_offset_table<R: Read + Seek>(r: &mut R, container: &ContainerHeader) -> Result<Vec<i64>> {
    let count = container.image_count as u64;
    let start = container.off_image_offsets as u64;
    let file_len = r.seek(SeekFrom::End(0))?;
    if start + count * 8 > file_len {
        return Err(CineError::Format(format!(
            "offset table of {count} entries at {start} runs past the end of the file ({file_len} bytes)"
        )));
    }

    r.seek(SeekFrom::Start(start))?;
    let mut offsets = vec![0i64; count as usize];
    r.read_i64_into::<LittleEndian>(&mut offsets)
        .map_err(|e| CineError::truncated("frame offset table", e))?;

    if let Some((index, bad)) = offsets.iter().enumerate().find(|(_, o)| **o < 0) {
        return Err(CineError::Format(format!("frame {index} has negative offset {bad}")));
    }
    Ok(offsets)
}
