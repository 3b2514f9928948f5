// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-document: Image processing for the Bildwerk converter.
//
// Provides format conversion (HEIC/PNG/JPG/WebP), dimension probing, resize
// geometry, resize/rotate/crop transforms, PDF page layout and rendering,
// and ZIP packaging.

pub mod archive;
pub mod convert;
pub mod geometry;
pub mod heic;
pub mod image;
pub mod pdf;

// Re-export the primary entry points so callers can use
// `bildwerk_document::FormatConverter` etc.
pub use archive::{build_archive, unique_name};
pub use convert::FormatConverter;
pub use geometry::{compute_dimensions, resolve_resize};
pub use heic::HeicCodec;
pub use crate::image::processor::{ImageProcessor, crop, resize, resize_with, rotate};
pub use pdf::{PdfWriter, RenderedPdf};

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use ::image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    /// Deterministic pseudo-random opaque pixels.
    pub fn noise(width: u32, height: u32) -> RgbaImage {
        let mut state: u32 = 0x2545_f491;
        RgbaImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            };
            Rgba([next(), next(), next(), 255])
        })
    }

    pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(pixel))
    }

    /// Encode `image` as `format`. Formats without alpha get RGB.
    pub fn encoded(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let dynamic = match format {
            ImageFormat::Jpeg | ImageFormat::Pnm => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8())
            }
            _ => DynamicImage::ImageRgba8(image.clone()),
        };
        let mut buffer = Vec::new();
        dynamic.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }
}
