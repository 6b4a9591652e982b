use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    cine::{Setup, read_header},
    color::ColorPipeline,
    common::error::{CineError, Result},
    conversions::timing::PipelineTimings,
    raw::{FrameReader, RawFrame},
    tiff::{ConversionConfig, StandardTiffWriter, TiffWriter},
};

/// Output name for stored frame `index` of the clip `stem`.
pub fn frame_file_name(stem: &str, index: usize) -> String {
    format!("{stem}-{index:06}.tif")
}

/// Outcome of exporting a frame range.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Frames that could not be decoded, by stored index.
    pub failed: Vec<(usize, CineError)>,
    pub timings: PipelineTimings,
}

pub struct CineToTiffPipeline<W: TiffWriter = StandardTiffWriter> {
    writer: W,
    color: ColorPipeline,
    config: ConversionConfig,
}

impl CineToTiffPipeline<StandardTiffWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self::with_writer(StandardTiffWriter, config)
    }
}

impl<W: TiffWriter> CineToTiffPipeline<W> {
    pub fn with_writer(writer: W, config: ConversionConfig) -> Self {
        Self { writer, color: ColorPipeline::new(config.color.clone()), config }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(CineError::Format(format!("invalid frame dimensions {width}x{height}")));
        }

        Ok(())
    }

    /// Encodes one decoded frame, as RGB or as the raw CFA grid.
    #[instrument(skip_all, fields(width = raw.width, height = raw.height))]
    pub fn convert_frame(&self, raw: &RawFrame, setup: &Setup, output: &mut dyn Write) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();

        timings.time("validate_dimensions", || self.validate_dimensions(raw.width, raw.height))?;

        if self.config.debayer {
            let image = timings.time("color_pipeline", || self.color.process(raw, setup, raw.bits_per_sample))?;
            let rgb = timings.time("quantize", || image.to_rgb16(self.config.output_bits))?;
            timings.time("encode_tiff", || self.writer.write_rgb(&rgb, output, &self.config))?;
        } else {
            timings.time("encode_tiff", || self.writer.write_raw(raw, output, &self.config))?;
        }

        Ok(timings)
    }

    /// Writes `count` frames from stored index `start` (or all remaining) to
    /// `out_dir` as `<stem>-<index>.tif`.
    ///
    /// Frames that fail to decode are logged and reported in the summary;
    /// output failures abort the export.
    #[instrument(skip(self, input, out_dir), fields(input = %input.as_ref().display()))]
    pub fn export<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        out_dir: Q,
        start: usize,
        count: Option<usize>,
    ) -> Result<ExportSummary> {
        let input = input.as_ref();
        let out_dir = out_dir.as_ref();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());

        let mut summary = ExportSummary::default();
        let header = summary.timings.time("read_header", || read_header(input))?;
        let setup = header.setup.clone();
        let reader = FrameReader::open_with_options(input, header, self.config.decode.clone())?;

        let frames = reader.into_frames(start, count)?;
        for (index, frame) in (start..).zip(frames) {
            let raw = match frame {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(index, error = %e, "skipping frame");
                    summary.failed.push((index, e));
                    continue;
                }
            };

            let path = out_dir.join(frame_file_name(&stem, index));
            let mut file = std::fs::File::create(&path)?;
            let timings = self.convert_frame(&raw, &setup, &mut file)?;
            summary.timings.merge(&timings);
            info!(path = %path.display(), "wrote frame");
            summary.written.push(path);
        }

        info!(
            written = summary.written.len(),
            failed = summary.failed.len(),
            "Export complete in {:.3}ms",
            summary.timings.total_duration().as_secs_f64() * 1000.0
        );
        Ok(summary)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.color = ColorPipeline::new(config.color.clone());
        self.config = config;
    }
}
