//! Fixed-size structures at the start of a CINE file.
//!
//! Both structures are packed little-endian records; every field is kept so a
//! parsed header can be written back byte for byte.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::image_pipeline::common::error::{CineError, Result};

/// `"CI"` read as a little-endian u16.
pub const CINE_MAGIC: u16 = u16::from_le_bytes(*b"CI");

/// Seconds since the epoch with a 32-bit binary fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time64 {
    pub fractions: u32,
    pub seconds: u32,
}

impl Time64 {
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.fractions as f64 / 4_294_967_296.0
    }
}

/// The CINEFILEHEADER record at offset 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    pub file_type: u16,
    pub header_size: u16,
    pub compression: u16,
    pub version: u16,
    pub first_movie_image: i32,
    pub total_image_count: u32,
    /// Camera-relative number of the first stored frame.
    pub first_image_no: i32,
    /// Number of frames stored in this file.
    pub image_count: u32,
    pub off_image_header: u32,
    pub off_setup: u32,
    pub off_image_offsets: u32,
    pub trigger_time: Time64,
}

impl ContainerHeader {
    pub const SIZE: usize = 44;

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Self::read_fields(r).map_err(|e| CineError::truncated("container header", e))
    }

    fn read_fields<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            file_type: r.read_u16::<LittleEndian>()?,
            header_size: r.read_u16::<LittleEndian>()?,
            compression: r.read_u16::<LittleEndian>()?,
            version: r.read_u16::<LittleEndian>()?,
            first_movie_image: r.read_i32::<LittleEndian>()?,
            total_image_count: r.read_u32::<LittleEndian>()?,
            first_image_no: r.read_i32::<LittleEndian>()?,
            image_count: r.read_u32::<LittleEndian>()?,
            off_image_header: r.read_u32::<LittleEndian>()?,
            off_setup: r.read_u32::<LittleEndian>()?,
            off_image_offsets: r.read_u32::<LittleEndian>()?,
            trigger_time: Time64 {
                fractions: r.read_u32::<LittleEndian>()?,
                seconds: r.read_u32::<LittleEndian>()?,
            },
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.file_type)?;
        w.write_u16::<LittleEndian>(self.header_size)?;
        w.write_u16::<LittleEndian>(self.compression)?;
        w.write_u16::<LittleEndian>(self.version)?;
        w.write_i32::<LittleEndian>(self.first_movie_image)?;
        w.write_u32::<LittleEndian>(self.total_image_count)?;
        w.write_i32::<LittleEndian>(self.first_image_no)?;
        w.write_u32::<LittleEndian>(self.image_count)?;
        w.write_u32::<LittleEndian>(self.off_image_header)?;
        w.write_u32::<LittleEndian>(self.off_setup)?;
        w.write_u32::<LittleEndian>(self.off_image_offsets)?;
        w.write_u32::<LittleEndian>(self.trigger_time.fractions)?;
        w.write_u32::<LittleEndian>(self.trigger_time.seconds)?;
        Ok(())
    }
}

/// Pixel payload encodings found in `BitmapInfo::compression`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain 8 or 16 bit samples, stored bottom-up.
    Uncompressed,
    /// 10-bit samples, 4 per 5 bytes, non-linear codes.
    Packed10,
    /// 12-bit samples, 2 per 3 bytes.
    Packed12L,
    Other(u32),
}

impl From<u32> for Compression {
    fn from(code: u32) -> Self {
        match code {
            0 => Compression::Uncompressed,
            256 => Compression::Packed10,
            1024 => Compression::Packed12L,
            other => Compression::Other(other),
        }
    }
}

/// The BITMAPINFOHEADER record that follows the container header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitmapInfo {
    pub size: u32,
    pub width: i32,
    /// Negative heights mark top-down storage, as in any DIB header.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapInfo {
    pub const SIZE: usize = 40;

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Self::read_fields(r).map_err(|e| CineError::truncated("bitmap info header", e))
    }

    fn read_fields<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            size: r.read_u32::<LittleEndian>()?,
            width: r.read_i32::<LittleEndian>()?,
            height: r.read_i32::<LittleEndian>()?,
            planes: r.read_u16::<LittleEndian>()?,
            bit_count: r.read_u16::<LittleEndian>()?,
            compression: r.read_u32::<LittleEndian>()?,
            size_image: r.read_u32::<LittleEndian>()?,
            x_pels_per_meter: r.read_i32::<LittleEndian>()?,
            y_pels_per_meter: r.read_i32::<LittleEndian>()?,
            clr_used: r.read_u32::<LittleEndian>()?,
            clr_important: r.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.size)?;
        w.write_i32::<LittleEndian>(self.width)?;
        w.write_i32::<LittleEndian>(self.height)?;
        w.write_u16::<LittleEndian>(self.planes)?;
        w.write_u16::<LittleEndian>(self.bit_count)?;
        w.write_u32::<LittleEndian>(self.compression)?;
        w.write_u32::<LittleEndian>(self.size_image)?;
        w.write_i32::<LittleEndian>(self.x_pels_per_meter)?;
        w.write_i32::<LittleEndian>(self.y_pels_per_meter)?;
        w.write_u32::<LittleEndian>(self.clr_used)?;
        w.write_u32::<LittleEndian>(self.clr_important)?;
        Ok(())
    }

    pub fn compression(&self) -> Compression {
        Compression::from(self.compression)
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width.unsigned_abs() as usize
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height.unsigned_abs() as usize
    }

    /// Whether rows are stored bottom row first.
    pub fn is_bottom_up(&self) -> bool {
        self.height >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_container() -> ContainerHeader {
        ContainerHeader {
            file_type: CINE_MAGIC,
            header_size: ContainerHeader::SIZE as u16,
            compression: 0,
            version: 1,
            first_movie_image: -20,
            total_image_count: 120,
            first_image_no: -20,
            image_count: 100,
            off_image_header: 44,
            off_setup: 84,
            off_image_offsets: 10_472,
            trigger_time: Time64 { fractions: 1 << 31, seconds: 1_600_000_000 },
        }
    }

    #[test]
    fn test_container_header_layout() {
        let mut buf = Vec::new();
        sample_container().write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), ContainerHeader::SIZE);
        assert_eq!(&buf[0..2], b"CI");
        // ImageCount sits at byte 20, OffImageOffsets at byte 32.
        assert_eq!(u32::from_le_bytes(buf[20..24].try_into().unwrap()), 100);
        assert_eq!(u32::from_le_bytes(buf[32..36].try_into().unwrap()), 10_472);

        let parsed = ContainerHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, sample_container());
    }

    #[test]
    fn test_truncated_container_is_format_error() {
        let result = ContainerHeader::read_from(&mut Cursor::new(vec![0u8; 20]));
        assert!(matches!(result, Err(CineError::Format(_))));
    }

    #[test]
    fn test_trigger_time_fraction() {
        let t = Time64 { fractions: 1 << 31, seconds: 10 };
        assert_eq!(t.as_secs_f64(), 10.5);
    }

    #[test]
    fn test_bitmap_info_geometry() {
        let info = BitmapInfo { width: 640, height: -480, compression: 1024, ..Default::default() };
        assert_eq!(info.width(), 640);
        assert_eq!(info.height(), 480);
        assert!(!info.is_bottom_up());
        assert_eq!(info.compression(), Compression::Packed12L);

        let mut buf = Vec::new();
        info.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), BitmapInfo::SIZE);
        assert_eq!(BitmapInfo::read_from(&mut Cursor::new(&buf)).unwrap(), info);
    }

    #[test]
    fn test_compression_codes() {
        assert_eq!(Compression::from(0), Compression::Uncompressed);
        assert_eq!(Compression::from(256), Compression::Packed10);
        assert_eq!(Compression::from(7), Compression::Other(7));
    }
}
