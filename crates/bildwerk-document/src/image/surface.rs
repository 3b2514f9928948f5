// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offscreen RGBA drawing surface. Every pixel operation allocates one of
// these at the output size, draws into it, and hands it to the encoder.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::Dimensions;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// Largest surface we are willing to allocate (16384 x 16384 pixels).
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

/// Opaque white, used under JPEG output which has no alpha channel.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct Surface {
    canvas: RgbaImage,
}

impl Surface {
    /// Allocate a transparent surface of `dims`.
    pub fn allocate(dims: Dimensions) -> Result<Self> {
        if dims.pixel_count() > MAX_SURFACE_PIXELS {
            return Err(BildwerkError::ContextUnavailable(format!(
                "{dims} exceeds the {MAX_SURFACE_PIXELS} pixel surface limit"
            )));
        }
        Ok(Self {
            canvas: RgbaImage::new(dims.width, dims.height),
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.canvas.width(),
            height: self.canvas.height(),
        }
    }

    /// Paint every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = color;
        }
    }

    /// Copy `source` onto the surface at the origin, replacing what is there.
    pub fn paint(&mut self, source: &RgbaImage) {
        imageops::replace(&mut self.canvas, source, 0, 0);
    }

    /// Alpha-composite `source` over the surface at the origin.
    pub fn composite(&mut self, source: &RgbaImage) {
        imageops::overlay(&mut self.canvas, source, 0, 0);
    }

    /// Draw `source` stretched to the full surface size (Lanczos3).
    pub fn draw_scaled(&mut self, source: &DynamicImage) {
        let Dimensions { width, height } = self.dimensions();
        let scaled = imageops::resize(&source.to_rgba8(), width, height, FilterType::Lanczos3);
        self.paint(&scaled);
    }

    pub fn into_image(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.canvas)
    }
}
