// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the bildwerk-document crate: PNG-to-JPG
// conversion of a synthetic photo-sized image, and PDF page layout.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use bildwerk_core::{
    ConversionRequest, Dimensions, ImageBytes, ImageKind, PdfOptions, Quality, TargetFormat,
};
use bildwerk_document::FormatConverter;
use bildwerk_document::pdf::layout_pages;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Convert a 640x480 gradient PNG to JPG at quality 85.
fn bench_convert_png_to_jpg(c: &mut Criterion) {
    let img = RgbImage::from_fn(640, 480, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode bench fixture");
    let source = ImageBytes::new(png, Some(ImageKind::Png));
    let converter = FormatConverter::default();
    let request = ConversionRequest::new(TargetFormat::Jpg, Quality::new(85));

    c.bench_function("convert png->jpg (640x480)", |b| {
        b.iter(|| {
            let out = converter.convert(black_box(&source), &request);
            black_box(out.ok());
        });
    });
}

/// Lay out 100 mixed-orientation pages on A4 with auto orientation.
fn bench_layout_pages(c: &mut Criterion) {
    let images: Vec<Dimensions> = (0..100u32)
        .map(|i| Dimensions {
            width: 800 + i * 7,
            height: 600 + (i % 3) * 400,
        })
        .collect();
    let options = PdfOptions::default();

    c.bench_function("layout_pages (100 images)", |b| {
        b.iter(|| black_box(layout_pages(black_box(&images), &options).ok()));
    });
}

criterion_group!(benches, bench_convert_png_to_jpg, bench_layout_pages);
criterion_main!(benches);
