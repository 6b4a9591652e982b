use std::io::{Cursor, Write};

use tiff::encoder::colortype::{Gray16, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{CineError, Result};
use crate::image_pipeline::debayer::types::RgbImageData;
use crate::image_pipeline::raw::types::RawFrame;
use crate::image_pipeline::tiff::types::{ConversionConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn encode_error(e: tiff::TiffError) -> CineError {
    CineError::Encode(e.to_string())
}

fn encoder<'a>(buffer: &'a mut Vec<u8>, config: &ConversionConfig) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
    let compression = match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    };

    let mut encoder = TiffEncoder::new(Cursor::new(buffer))
        .map_err(encode_error)?
        .with_compression(compression);

    if let Some(predictor_val) = config.predictor {
        let predictor = match predictor_val {
            2 => Predictor::Horizontal,
            _ => Predictor::None,
        };
        encoder = encoder.with_predictor(predictor);
    }
    Ok(encoder)
}

impl TiffWriter for StandardTiffWriter {
    fn write_raw(&self, image: &RawFrame, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!("Encoding gray TIFF image: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        encoder(&mut buffer, config)?
            .write_image::<Gray16>(image.width as u32, image.height as u32, &image.data)
            .map_err(encode_error)?;
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_rgb(&self, image: &RgbImageData, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!("Encoding RGB TIFF image: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        encoder(&mut buffer, config)?
            .write_image::<RGB16>(image.width as u32, image.height as u32, &image.data)
            .map_err(encode_error)?;
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
