//! Synthetic CINE files for tests.

use std::path::{Path, PathBuf};

use crate::image_pipeline::cine::{BitmapInfo, CINE_MAGIC, ContainerHeader, Setup};

/// A small in-memory CINE file.
///
/// Layout: container header, bitmap header, `setup_gap` padding, setup,
/// tagged region, offset table, frame records.
pub(crate) struct SyntheticCine {
    pub width: i32,
    pub height: i32,
    pub compression: u32,
    pub bit_count: u16,
    pub first_image_no: i32,
    /// Bytes between the bitmap header and the setup; empty puts the setup at 84.
    pub setup_gap: Vec<u8>,
    pub setup: Setup,
    pub tagged: Vec<u8>,
    pub annotation: Vec<u8>,
    pub frames: Vec<Vec<u8>>,
}

impl SyntheticCine {
    /// 16-bit uncompressed RGGB file whose frames are given top row first.
    pub fn gray16(width: usize, height: usize, frames: &[Vec<u16>]) -> Self {
        let mut setup = Setup::full();
        setup.set_real_bpp(12).unwrap();
        setup.set_levels(0, 4095).unwrap();
        setup.set_cfa(4).unwrap();
        Self {
            width: width as i32,
            height: height as i32,
            compression: 0,
            bit_count: 16,
            first_image_no: 0,
            setup_gap: Vec::new(),
            setup,
            tagged: Vec::new(),
            annotation: vec![0xAA; 8],
            frames: frames.iter().map(|f| bottom_up_u16(f, width, height)).collect(),
        }
    }

    pub fn setup_offset(&self) -> u32 {
        (ContainerHeader::SIZE + BitmapInfo::SIZE + self.setup_gap.len()) as u32
    }

    pub fn offsets_offset(&self) -> u32 {
        self.setup_offset() + self.setup.as_bytes().len() as u32 + self.tagged.len() as u32
    }

    pub fn container(&self) -> ContainerHeader {
        ContainerHeader {
            file_type: CINE_MAGIC,
            header_size: ContainerHeader::SIZE as u16,
            compression: 0,
            version: 1,
            first_movie_image: self.first_image_no,
            total_image_count: self.frames.len() as u32,
            first_image_no: self.first_image_no,
            image_count: self.frames.len() as u32,
            off_image_header: ContainerHeader::SIZE as u32,
            off_setup: self.setup_offset(),
            off_image_offsets: self.offsets_offset(),
            ..Default::default()
        }
    }

    pub fn bitmap(&self) -> BitmapInfo {
        BitmapInfo {
            size: BitmapInfo::SIZE as u32,
            width: self.width,
            height: self.height,
            planes: 1,
            bit_count: self.bit_count,
            compression: self.compression,
            size_image: self.frames.first().map_or(0, |f| f.len() as u32),
            ..Default::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.container().write_to(&mut out).unwrap();
        self.bitmap().write_to(&mut out).unwrap();
        out.extend_from_slice(&self.setup_gap);
        out.extend_from_slice(self.setup.as_bytes());
        out.extend_from_slice(&self.tagged);

        let table_len = self.frames.len() * 8;
        let mut offset = out.len() + table_len;
        for frame in &self.frames {
            out.extend_from_slice(&(offset as i64).to_le_bytes());
            offset += 8 + self.annotation.len() + frame.len();
        }
        for frame in &self.frames {
            out.extend_from_slice(&(self.annotation.len() as u32 + 8).to_le_bytes());
            out.extend_from_slice(&self.annotation);
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            out.extend_from_slice(frame);
        }
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Serializes a top-down sample grid the way uncompressed frames are stored.
pub(crate) fn bottom_up_u16(samples: &[u16], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for row in (0..height).rev() {
        for &s in &samples[row * width..(row + 1) * width] {
            out.extend_from_slice(&s.to_le_bytes());
        }
    }
    out
}

pub(crate) fn tagged_block(tag: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(payload);
    out
}
