use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cineraw_rs::image_pipeline::cine::{BitmapInfo, ContainerHeader, Header, Setup, TaggedBlocks};
use cineraw_rs::image_pipeline::{
    CineFrameDecoder, CineToTiffPipeline, ColorPipeline, ConversionConfig, DecodeOptions, RawFrame,
    RawImageReader, TiffCompression,
};
use std::io::Cursor;

fn mock_header(width: usize, height: usize, compression: u32, bit_count: u16) -> Header {
    let mut setup = Setup::full();
    setup.set_cfa(4).unwrap();
    setup.set_real_bpp(12).unwrap();
    setup.set_levels(64, 4064).unwrap();
    setup
        .set_calib_matrix(&[[1.4, -0.3, -0.1], [-0.2, 1.3, -0.1], [0.0, -0.4, 1.4]])
        .unwrap();
    Header {
        container: ContainerHeader { image_count: 1, ..Default::default() },
        bitmap: BitmapInfo {
            width: width as i32,
            height: height as i32,
            bit_count,
            compression,
            ..Default::default()
        },
        setup,
        offsets: vec![0],
        tagged: TaggedBlocks::default(),
    }
}

fn mock_payload_u16(width: usize, height: usize) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (((x + y) * 7) % 4096) as u16))
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

fn mock_payload_p10(width: usize, height: usize) -> Vec<u8> {
    (0..width * height * 5 / 4).map(|i| (i * 31 % 256) as u8).collect()
}

fn mock_frame(width: usize, height: usize) -> RawFrame {
    let header = mock_header(width, height, 0, 16);
    CineFrameDecoder::from_header(&header, DecodeOptions::default())
        .read_raw(&mock_payload_u16(width, height))
        .unwrap()
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let (width, height) = (1024, 768);

    let cases = vec![
        ("uncompressed16", mock_header(width, height, 0, 16), mock_payload_u16(width, height)),
        ("packed10", mock_header(width, height, 256, 10), mock_payload_p10(width, height)),
    ];

    for (label, header, payload) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(label), &payload, |b, data| {
            let decoder = CineFrameDecoder::from_header(&header, DecodeOptions::default());
            b.iter(|| decoder.read_raw(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_color_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_by_size");
    let setup = mock_header(2, 2, 0, 16).setup;

    for (width, height, label) in [(128, 128, "128x128"), (512, 512, "512x512"), (1024, 768, "1024x768")] {
        let frame = mock_frame(width, height);
        group.bench_with_input(BenchmarkId::from_parameter(label), &frame, |b, raw| {
            let pipeline = ColorPipeline::default();
            b.iter(|| pipeline.process(black_box(raw), &setup, 12).unwrap());
        });
    }

    group.finish();
}

fn benchmark_compression_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression_methods");
    let frame = mock_frame(512, 512);
    let setup = mock_header(2, 2, 0, 16).setup;

    let compressions = vec![
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateFast, "deflate_fast"),
        (TiffCompression::DeflateBest, "deflate_best"),
    ];

    for (compression, label) in compressions {
        group.bench_with_input(BenchmarkId::from_parameter(label), &frame, |b, raw| {
            let config = ConversionConfig::builder().compression(compression).build();
            let pipeline = CineToTiffPipeline::new(config);

            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                pipeline.convert_frame(black_box(raw), &setup, &mut output).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_raw_export(c: &mut Criterion) {
    let frame = mock_frame(1024, 768);
    let setup = mock_header(2, 2, 0, 16).setup;
    let pipeline = CineToTiffPipeline::new(ConversionConfig::builder().debayer(false).build());

    c.bench_function("raw_gray_tiff_1024x768", |b| {
        b.iter(|| {
            let mut output = Cursor::new(Vec::new());
            pipeline.convert_frame(black_box(&frame), &setup, &mut output).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_color_by_size,
    benchmark_compression_methods,
    benchmark_raw_export
);
criterion_main!(benches);
