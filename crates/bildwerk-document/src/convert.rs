// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format converter: re-encode any supported input as PNG, JPG, or WebP.
//
// HEIC/HEIF input is handed to the HEIC codec. Everything else is decoded,
// drawn onto a surface at its native size (over opaque white for JPG, which
// has no alpha channel), and encoded at the requested quality.

use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{ConversionRequest, Dimensions, ImageBytes, TargetFormat};
use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::heic::{self, HeicCodec};
use crate::image::codec;
use crate::image::probe::{probe, sniff_kind};
use crate::image::surface::{Surface, WHITE};

/// Converts images between formats.
#[derive(Clone)]
pub struct FormatConverter {
    heic: Arc<dyn HeicCodec>,
}

impl FormatConverter {
    pub fn new(heic: Arc<dyn HeicCodec>) -> Self {
        Self { heic }
    }

    /// Converter using the HEIC codec compiled into this build.
    pub fn with_default_codec() -> Self {
        Self::new(heic::default_codec())
    }

    /// Pixel size of `source`, HEIC/HEIF included.
    pub fn probe(&self, source: &ImageBytes) -> Result<Dimensions> {
        match source.kind().or_else(|| sniff_kind(source.as_slice())) {
            Some(kind) if kind.is_heif_family() => self.heic.probe(source.as_slice()),
            _ => probe(source),
        }
    }

    /// Re-encode `source` as `request.format`.
    #[instrument(skip(self, source), fields(bytes_len = source.len(), format = %request.format, quality = request.quality.value()))]
    pub fn convert(&self, source: &ImageBytes, request: &ConversionRequest) -> Result<ImageBytes> {
        let kind = source.kind().or_else(|| sniff_kind(source.as_slice()));
        info!(source_kind = ?kind, "Starting conversion");

        let quality = request.effective_quality();
        let data = if kind.is_some_and(|k| k.is_heif_family()) {
            self.convert_heic(source, request.format, quality)?
        } else {
            convert_raster(source, request.format, quality)?
        };

        debug!(output_bytes = data.len(), "Conversion complete");
        Ok(ImageBytes::new(data, Some(request.format.kind())))
    }

    fn convert_heic(&self, source: &ImageBytes, format: TargetFormat, quality: f32) -> Result<Vec<u8>> {
        let outputs = self
            .heic
            .convert(source.as_slice(), format, quality)
            .map_err(|err| match err {
                BildwerkError::Conversion(_) => err,
                other => BildwerkError::Conversion(format!("HEIC conversion failed: {other}")),
            })?;
        debug!(images = outputs.len(), "HEIC codec returned");
        outputs
            .into_iter()
            .next()
            .ok_or_else(|| BildwerkError::Conversion("HEIC decoder returned no images".into()))
    }
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self::with_default_codec()
    }
}

fn convert_raster(source: &ImageBytes, format: TargetFormat, quality: f32) -> Result<Vec<u8>> {
    let decoded = codec::decode(source)
        .map_err(|err| BildwerkError::Conversion(format!("failed to load image: {err}")))?;
    let drawn = rasterize_for(&decoded, format)?;
    codec::encode(&drawn, format.kind(), quality)
}

/// Draw `image` onto a surface of its native size, ready for `format`.
///
/// JPG output gets an opaque white background so transparent pixels do not
/// turn black.
pub(crate) fn rasterize_for(image: &DynamicImage, format: TargetFormat) -> Result<DynamicImage> {
    let dims = Dimensions::new(image.width(), image.height())?;
    let mut surface = Surface::allocate(dims)?;
    let rgba = image.to_rgba8();
    if format == TargetFormat::Jpg {
        surface.fill(WHITE);
        surface.composite(&rgba);
    } else {
        surface.paint(&rgba);
    }
    Ok(surface.into_image())
}
