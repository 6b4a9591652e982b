//! Random-access and sequential frame retrieval.
//!
//! A `FrameReader` owns one open handle for its lifetime. Each frame is read
//! with a single seek to its record followed by sequential reads, so the
//! handle must not be shared between callers without external locking.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::image_pipeline::cine::Header;
use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::raw::cine_decoder::CineFrameDecoder;
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{DecodeOptions, FrameRecord, RawFrame};

/// Bytes counted by `annotationSize` besides the annotation itself.
const RECORD_OVERHEAD: u32 = 8;

pub struct FrameReader<R = BufReader<File>, D = CineFrameDecoder> {
    source: R,
    header: Header,
    decoder: D,
}

impl FrameReader {
    pub fn open<P: AsRef<Path>>(path: P, header: Header) -> Result<Self> {
        Self::open_with_options(path, header, DecodeOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        header: Header,
        options: DecodeOptions,
    ) -> Result<Self> {
        let source = BufReader::new(File::open(path.as_ref())?);
        let decoder = CineFrameDecoder::from_header(&header, options);
        Ok(Self { source, header, decoder })
    }
}

impl<R: Read + Seek, D: RawImageReader> FrameReader<R, D> {
    pub fn with_source(source: R, header: Header, decoder: D) -> Self {
        Self { source, header, decoder }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn frame_count(&self) -> usize {
        self.header.offsets.len()
    }

    /// Reads the undecoded record of stored frame `index`.
    pub fn read_record(&mut self, index: usize) -> Result<FrameRecord> {
        let offset = self.header.frame_offset(index)?;
        debug!(index, offset, "reading frame record");

        self.source.seek(SeekFrom::Start(offset))?;
        let annotation_size = self.source.read_u32::<LittleEndian>()?;
        if annotation_size < RECORD_OVERHEAD {
            return Err(CineError::Format(format!(
                "frame {index} declares annotation size {annotation_size}"
            )));
        }
        let annotation = read_exact_vec(&mut self.source, (annotation_size - RECORD_OVERHEAD) as u64)?;
        let image_size = self.source.read_u32::<LittleEndian>()?;
        let payload = read_exact_vec(&mut self.source, image_size as u64)?;

        Ok(FrameRecord { annotation, payload })
    }

    /// Reads and decodes stored frame `index`.
    pub fn get(&mut self, index: usize) -> Result<RawFrame> {
        let record = self.read_record(index)?;
        self.decoder.read_raw(&record.payload)
    }

    /// Reads and decodes the frame with camera-relative number `camera_frame`.
    pub fn get_by_frame_number(&mut self, camera_frame: i64) -> Result<RawFrame> {
        let index = self.header.stored_index(camera_frame)?;
        self.get(index)
    }

    /// Lazily decodes `count` frames from `start`, or all remaining frames.
    pub fn frames(&mut self, start: usize, count: Option<usize>) -> Result<Frames<'_, R, D>> {
        let end = frame_range(start, count, self.frame_count(), self.header.frame_count())?;
        Ok(Frames { reader: self, next: start, end })
    }

    /// Like `frames`, but the iterator owns the reader and its handle.
    pub fn into_frames(self, start: usize, count: Option<usize>) -> Result<IntoFrames<R, D>> {
        let end = frame_range(start, count, self.frame_count(), self.header.frame_count())?;
        Ok(IntoFrames { reader: self, next: start, end })
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

fn frame_range(start: usize, count: Option<usize>, available: usize, declared: u32) -> Result<usize> {
    let end = match count {
        Some(n) => start.checked_add(n).unwrap_or(usize::MAX),
        None => available.max(start),
    };
    if start > available || end > available {
        return Err(CineError::OutOfRange { index: end.saturating_sub(1) as i64, count: declared });
    }
    Ok(end)
}

fn read_exact_vec<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(CineError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("frame record truncated: {} of {len} bytes", buf.len()),
        )));
    }
    Ok(buf)
}

/// Forward-only frame sequence borrowing a reader.
///
/// A failed frame yields `Some(Err(_))` and the sequence continues with the
/// next one; `None` only marks the end of the range.
pub struct Frames<'a, R, D> {
    reader: &'a mut FrameReader<R, D>,
    next: usize,
    end: usize,
}

impl<R: Read + Seek, D: RawImageReader> Iterator for Frames<'_, R, D> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.reader.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.next;
        (left, Some(left))
    }
}

/// Forward-only frame sequence owning its reader.
pub struct IntoFrames<R, D> {
    reader: FrameReader<R, D>,
    next: usize,
    end: usize,
}

impl<R, D> IntoFrames<R, D> {
    /// Stored index of the frame the next call to `next` will yield.
    pub fn position(&self) -> usize {
        self.next
    }
}

impl<R: Read + Seek, D: RawImageReader> Iterator for IntoFrames<R, D> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.reader.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.next;
        (left, Some(left))
    }
}
