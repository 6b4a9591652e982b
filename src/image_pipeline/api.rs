//! Path-based entry points over the header, frame and color modules.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::image_pipeline::cine::Header;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::{CineFrameDecoder, FrameReader, IntoFrames, RawFrame};

pub type FrameIter = IntoFrames<BufReader<File>, CineFrameDecoder>;

/// Number of stored frames.
pub fn frame_count(header: &Header) -> u32 {
    header.frame_count()
}

/// Sample depth of decoded frames: 12 for 10-bit packed data, `RealBPP` otherwise.
pub fn bits_per_pixel(header: &Header) -> u32 {
    header.bits_per_pixel()
}

/// Opens `path` and decodes stored frame `index`.
pub fn read_frame<P: AsRef<Path>>(path: P, header: &Header, index: usize) -> Result<RawFrame> {
    header.check_index(index)?;
    debug!(path = %path.as_ref().display(), index, "reading single frame");
    FrameReader::open(path, header.clone())?.get(index)
}

/// Opens `path` and lazily decodes `count` frames from `start`, or all
/// remaining frames. The file stays open until the iterator is dropped.
pub fn iterate_frames<P: AsRef<Path>>(
    path: P,
    header: &Header,
    start: usize,
    count: Option<usize>,
) -> Result<FrameIter> {
    FrameReader::open(path, header.clone())?.into_frames(start, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cine::read_header;
    use crate::image_pipeline::testing::SyntheticCine;

    #[test]
    fn test_read_and_iterate() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Vec<u16>> = (0..5).map(|i| (0..12).map(|p| p + i * 100).collect()).collect();
        let path = SyntheticCine::gray16(4, 3, &frames).write_to(dir.path(), "a.cine");
        let header = read_header(&path).unwrap();

        assert_eq!(frame_count(&header), 5);
        assert_eq!(bits_per_pixel(&header), 12);
        assert_eq!(read_frame(&path, &header, 4).unwrap().data, frames[4]);
        assert!(read_frame(&path, &header, 5).unwrap_err().is_out_of_range());

        let got: Vec<RawFrame> = iterate_frames(&path, &header, 2, Some(2))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].data, frames[3]);
        assert!(iterate_frames(&path, &header, 4, Some(2)).is_err());
    }
}
