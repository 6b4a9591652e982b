//! Bit unpacking for the supported pixel payload encodings.
//!
//! Every function returns exactly `count` samples in storage order and fails
//! when the payload is too short to hold them.

use crate::image_pipeline::common::error::{CineError, Result};

fn ensure_len(encoding: &str, data: &[u8], count: usize, bits: usize) -> Result<()> {
    let needed = (count * bits).div_ceil(8);
    if data.len() < needed {
        return Err(CineError::Format(format!(
            "{encoding} payload holds {} bytes, {needed} needed for {count} samples",
            data.len()
        )));
    }
    Ok(())
}

/// Plain 8-bit samples.
pub fn unpack_u8(data: &[u8], count: usize) -> Result<Vec<u16>> {
    ensure_len("8-bit", data, count, 8)?;
    Ok(data[..count].iter().map(|&b| b as u16).collect())
}

/// Plain little-endian 16-bit samples.
pub fn unpack_u16(data: &[u8], count: usize) -> Result<Vec<u16>> {
    ensure_len("16-bit", data, count, 16)?;
    Ok(data[..count * 2]
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Four 10-bit samples per five bytes, most significant bits first.
#[inline]
pub fn unpack_p10_group(b: [u8; 5]) -> [u16; 4] {
    let b = b.map(u16::from);
    [
        (b[0] << 2) | (b[1] >> 6),
        ((b[1] & 0x3F) << 4) | (b[2] >> 4),
        ((b[2] & 0x0F) << 6) | (b[3] >> 2),
        ((b[3] & 0x03) << 8) | b[4],
    ]
}

/// Two 12-bit samples per three bytes, most significant bits first.
#[inline]
pub fn unpack_p12l_group(b: [u8; 3]) -> [u16; 2] {
    let b = b.map(u16::from);
    [(b[0] << 4) | (b[1] >> 4), ((b[1] & 0x0F) << 8) | b[2]]
}

pub fn unpack_p10(data: &[u8], count: usize) -> Result<Vec<u16>> {
    ensure_len("P10", data, count, 10)?;
    Ok(unpack_groups::<5, 4>(data, count, unpack_p10_group))
}

pub fn unpack_p12l(data: &[u8], count: usize) -> Result<Vec<u16>> {
    ensure_len("P12L", data, count, 12)?;
    Ok(unpack_groups::<3, 2>(data, count, unpack_p12l_group))
}

/// Runs `unpack` over fixed-size byte groups; a trailing partial group is zero padded.
fn unpack_groups<const B: usize, const S: usize>(
    data: &[u8],
    count: usize,
    unpack: impl Fn([u8; B]) -> [u16; S],
) -> Vec<u16> {
    let groups = count.div_ceil(S);
    let mut out = Vec::with_capacity(groups * S);
    for g in 0..groups {
        let start = g * B;
        let mut bytes = [0u8; B];
        let end = (start + B).min(data.len());
        bytes[..end - start].copy_from_slice(&data[start..end]);
        out.extend_from_slice(&unpack(bytes));
    }
    out.truncate(count);
    out
}

/// Reverses row order in place.
pub fn flip_rows(samples: &mut [u16], width: usize) {
    if width == 0 {
        return;
    }
    let height = samples.len() / width;
    for row in 0..height / 2 {
        let (top, bottom) = samples.split_at_mut((height - 1 - row) * width);
        top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
}
