use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use cineraw_rs::image_pipeline::cine::{
    Header, MIN_EDITABLE_SOFTWARE_VERSION, ToneCurve, ensure_software_version, read_header, write_header,
};
use cineraw_rs::image_pipeline::{
    CineToTiffPipeline, ColorConfig, ConversionConfig, DecodeOptions, GammaMode, MatrixNormalization, P10Rescale,
    TiffCompression, bits_per_pixel,
};
use cineraw_rs::logger;

#[derive(Parser)]
#[command(name = "cineraw", version, about = "Inspect, edit and export CINE high-speed camera clips")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show clip metadata
    Show {
        #[arg(required = true)]
        clips: Vec<PathBuf>,
    },
    /// Export frames as 16-bit TIFF files
    Export(ExportArgs),
    /// Set metadata fields; a backup of each header is written first
    Set(SetArgs),
    /// Copy metadata from a source clip; a backup of each header is written first
    Copy(CopyArgs),
}

#[derive(Args)]
struct ExportArgs {
    clip: PathBuf,
    /// First stored frame to export
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// Number of frames; all remaining frames when omitted
    #[arg(long)]
    count: Option<usize>,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Write the grayscale CFA grid instead of color RGB
    #[arg(long)]
    raw: bool,
    #[arg(long, value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,
    /// Use the per-file gamma fields instead of a fixed 2.2
    #[arg(long)]
    gamma_from_setup: bool,
    /// Rescale 10-bit packed data with the setup's levels instead of [64, 4064]
    #[arg(long)]
    p10_from_setup: bool,
    /// Normalize the color matrix by diagonal residual instead of row sums
    #[arg(long)]
    diagonal_residual: bool,
    /// Replace samples above the white level with a same-color median
    #[arg(long)]
    defect_correction: bool,
    /// Ignore the crop and resample settings stored in the clip
    #[arg(long)]
    no_geometry: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    Deflate,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
        }
    }
}

#[derive(Args)]
struct SetArgs {
    #[arg(required = true)]
    clips: Vec<PathBuf>,
    /// Color temperature (does not change the calibration matrix)
    #[arg(long)]
    temp: Option<f32>,
    /// Color correction (does not change the calibration matrix)
    #[arg(long)]
    cc: Option<f32>,
    #[arg(long)]
    record_fps: Option<u32>,
    #[arg(long)]
    playback_fps: Option<f32>,
    #[arg(long)]
    timecode_fps: Option<f32>,
    /// Tone curve as "[LABEL] x1 y1 x2 y2 ...", up to 32 points
    #[arg(long)]
    tone: Option<String>,
}

#[derive(Args)]
struct CopyArgs {
    source: PathBuf,
    #[arg(required = true)]
    destinations: Vec<PathBuf>,
    /// Copy white balance: temperature, cc, calibration matrix and gains
    #[arg(long)]
    wb: bool,
    /// Copy the tone curve
    #[arg(long)]
    tone: bool,
    /// Copy white balance and tone curve
    #[arg(long)]
    all: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for_verbosity(cli.verbose));

    match cli.command {
        Command::Show { clips } => show(&clips),
        Command::Export(args) => export(args),
        Command::Set(args) => set(args),
        Command::Copy(args) => copy(args),
    }
}

fn read_editable(path: &Path) -> Result<Header> {
    let header = read_header(path).with_context(|| format!("reading {}", path.display()))?;
    ensure_software_version(&header, MIN_EDITABLE_SOFTWARE_VERSION)
        .with_context(|| format!("{} cannot be edited", path.display()))?;
    Ok(header)
}

fn describe(path: &Path, header: &Header) -> String {
    let setup = &header.setup;
    let calib = setup.calib_matrix();
    let mut lines = vec![
        format!("Clip: {}", path.display()),
        format!("Camera: {} (serial {})", setup.camera_model(), setup.serial()),
        format!("Created by: {}", setup.created_by()),
        format!("Software version: {}", setup.software_version()),
        format!("Frames: {} (first {})", header.frame_count(), header.container.first_image_no),
        format!("Size: {}x{}", header.width(), header.height()),
        format!("Compression: {:?}, {} bits per pixel", header.bitmap.compression(), bits_per_pixel(header)),
        format!("Record FPS: {}", setup.frame_rate()),
        format!("Playback FPS: {}", setup.playback_rate()),
        format!("Timecode FPS: {}", setup.timecode_rate()),
        format!("Temp: {}", setup.wb_temp()),
        format!("CC: {}", setup.wb_cc()),
        format!("CalibrationInfo: {}", setup.calibration_info()),
        format!("OpticalFilter: {}", setup.optical_filter()),
        format!("cmCalib: {:?}", calib.as_flattened()),
        format!("Tone points: {}", setup.tone_curve()),
    ];
    if let Some(first) = header.timestamp(0) {
        lines.push(format!("First frame time: {first:.6}s"));
    }
    if let Some(exposure) = header.exposure(0) {
        lines.push(format!("First frame exposure: {exposure:.9}s"));
    }
    lines.join("\n")
}

fn show(clips: &[PathBuf]) -> Result<()> {
    for clip in clips {
        match read_header(clip) {
            Ok(header) => println!("{}\n", describe(clip, &header)),
            Err(e) => warn!("Could not read {}: {e}", clip.display()),
        }
    }
    Ok(())
}

fn export(args: ExportArgs) -> Result<()> {
    let decode = DecodeOptions::builder()
        .p10_rescale(if args.p10_from_setup { P10Rescale::FromSetup } else { P10Rescale::Fixed })
        .defect_correction(args.defect_correction)
        .build();
    let color = ColorConfig::builder()
        .gamma(if args.gamma_from_setup { GammaMode::FromSetup } else { GammaMode::default() })
        .normalization(if args.diagonal_residual {
            MatrixNormalization::DiagonalResidual
        } else {
            MatrixNormalization::RowSum
        })
        .post_process(!args.no_geometry)
        .build();
    let config = ConversionConfig::builder()
        .compression(args.compression.into())
        .debayer(!args.raw)
        .decode(decode)
        .color(color)
        .build();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let pipeline = CineToTiffPipeline::new(config);
    let summary = pipeline
        .export(&args.clip, &args.out_dir, args.start, args.count)
        .with_context(|| format!("exporting {}", args.clip.display()))?;

    summary.timings.log_summary();
    for (index, error) in &summary.failed {
        warn!("Frame {index} skipped: {error}");
    }
    info!("Wrote {} frames to {}", summary.written.len(), args.out_dir.display());
    if summary.written.is_empty() && !summary.failed.is_empty() {
        bail!("no frame of {} could be decoded", args.clip.display());
    }
    Ok(())
}

fn set(args: SetArgs) -> Result<()> {
    let tone = args.tone.as_deref().map(ToneCurve::parse).transpose().context("parsing --tone")?;
    let changes = args.temp.is_some()
        || args.cc.is_some()
        || args.record_fps.is_some()
        || args.playback_fps.is_some()
        || args.timecode_fps.is_some()
        || tone.is_some();
    if !changes {
        warn!("Nothing to set");
        return Ok(());
    }

    for clip in &args.clips {
        let mut header = read_editable(clip)?;
        let setup = &mut header.setup;

        if let Some(temp) = args.temp {
            warn!("Setting the temperature does not change the calibration matrix");
            setup.set_wb_temp(temp)?;
        }
        if let Some(cc) = args.cc {
            warn!("Setting cc does not change the calibration matrix");
            setup.set_wb_cc(cc)?;
        }
        if let Some(tone) = &tone {
            setup.set_tone_curve(tone)?;
        }
        if let Some(fps) = args.record_fps {
            setup.set_frame_rate(fps)?;
        }
        if let Some(fps) = args.playback_fps {
            setup.set_playback_rate(fps)?;
        }
        if let Some(fps) = args.timecode_fps {
            setup.set_timecode_rate(fps)?;
        }

        info!("Writing metadata to {}", clip.display());
        write_header(clip, &header, true).with_context(|| format!("writing {}", clip.display()))?;
    }
    Ok(())
}

fn copy(args: CopyArgs) -> Result<()> {
    let (wb, tone) = (args.wb || args.all, args.tone || args.all);
    if !wb && !tone {
        bail!("choose what to copy with --wb, --tone or --all");
    }

    let source = read_editable(&args.source)?;
    if wb {
        info!("Temp: {}", source.setup.wb_temp());
        info!("CC: {}", source.setup.wb_cc());
    }
    if tone {
        info!("Tone points: {}", source.setup.tone_curve());
    }

    for dest in &args.destinations {
        let mut header = read_editable(dest)?;
        if wb {
            header.setup.copy_white_balance_from(&source.setup)?;
        }
        if tone {
            header.setup.copy_tone_from(&source.setup)?;
        }
        info!("Writing metadata to {}", dest.display());
        write_header(dest, &header, true).with_context(|| format!("writing {}", dest.display()))?;
    }
    Ok(())
}
