// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster decode/encode. PNG, JPEG, GIF, BMP and TIFF go through the `image`
// crate; lossy WebP goes through libwebp via the `webp` crate because
// `image` only writes lossless WebP.

use std::io::Cursor;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{ImageBytes, ImageKind};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, instrument};

/// Decode any raster format `image` understands, ignoring the declared kind.
#[instrument(skip(source), fields(bytes_len = source.len()))]
pub fn decode(source: &ImageBytes) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(source.as_slice()))
        .with_guessed_format()
        .map_err(|err| BildwerkError::Decode(format!("failed to read image: {err}")))?;
    let image = reader
        .decode()
        .map_err(|err| BildwerkError::Decode(format!("failed to decode image: {err}")))?;
    debug!(width = image.width(), height = image.height(), "Image decoded from bytes");
    Ok(image)
}

/// Encode `image` as `kind` at `quality` (0.0–1.0; ignored by lossless formats).
pub fn encode(image: &DynamicImage, kind: ImageKind, quality: f32) -> Result<Vec<u8>> {
    let buffer = match kind {
        ImageKind::Jpeg => {
            let mut buffer = Vec::new();
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, encoder_quality(quality));
            rgb.write_with_encoder(encoder)
                .map_err(|err| BildwerkError::Encode(format!("JPEG encoding failed: {err}")))?;
            buffer
        }
        ImageKind::WebP => {
            let rgba = image.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            let memory = encoder
                .encode_simple(false, encoder_quality(quality) as f32)
                .map_err(|err| BildwerkError::Encode(format!("WebP encoding failed: {err:?}")))?;
            memory.to_vec()
        }
        ImageKind::Png => encode_with_image(image, ImageFormat::Png)?,
        ImageKind::Gif => encode_with_image(image, ImageFormat::Gif)?,
        ImageKind::Bmp => encode_with_image(image, ImageFormat::Bmp)?,
        ImageKind::Tiff => encode_with_image(image, ImageFormat::Tiff)?,
        ImageKind::Heic | ImageKind::Heif => {
            return Err(BildwerkError::UnsupportedFormat(format!(
                "{kind} cannot be used as an output format"
            )));
        }
    };

    if buffer.is_empty() {
        return Err(BildwerkError::Encode(format!("{kind} encoder returned no data")));
    }
    debug!(%kind, quality, bytes = buffer.len(), "Image encoded");
    Ok(buffer)
}

/// Format to write when re-encoding a transformed `source` kind.
///
/// The source format is preserved where we can write it; anything else
/// (unknown, HEIC/HEIF) falls back to JPEG.
pub fn reencode_kind(source: Option<ImageKind>) -> ImageKind {
    match source {
        Some(kind @ (ImageKind::Png
        | ImageKind::Jpeg
        | ImageKind::WebP
        | ImageKind::Gif
        | ImageKind::Bmp
        | ImageKind::Tiff)) => kind,
        _ => ImageKind::Jpeg,
    }
}

/// Map a 0.0–1.0 quality factor onto the 1–100 scale encoders expect.
fn encoder_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_with_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
    rgba.write_to(&mut cursor, format)
        .map_err(|err| BildwerkError::Encode(format!("{format:?} encoding failed: {err}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::probe::sniff_kind;
    use crate::test_support::noise;

    #[test]
    fn encodes_every_writable_kind() {
        let image = DynamicImage::ImageRgba8(noise(16, 12));
        for kind in [
            ImageKind::Png,
            ImageKind::Jpeg,
            ImageKind::WebP,
            ImageKind::Gif,
            ImageKind::Bmp,
            ImageKind::Tiff,
        ] {
            let bytes = encode(&image, kind, 0.8).unwrap();
            assert_eq!(sniff_kind(&bytes), Some(kind), "{kind}");
        }
    }

    #[test]
    fn heic_is_not_an_output() {
        let image = DynamicImage::ImageRgba8(noise(4, 4));
        assert!(matches!(
            encode(&image, ImageKind::Heic, 1.0),
            Err(BildwerkError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn lower_jpeg_quality_is_smaller() {
        let image = DynamicImage::ImageRgba8(noise(128, 128));
        let low = encode(&image, ImageKind::Jpeg, 0.1).unwrap();
        let high = encode(&image, ImageKind::Jpeg, 0.95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn reencode_preserves_writable_kinds() {
        assert_eq!(reencode_kind(Some(ImageKind::Png)), ImageKind::Png);
        assert_eq!(reencode_kind(Some(ImageKind::WebP)), ImageKind::WebP);
        assert_eq!(reencode_kind(Some(ImageKind::Heic)), ImageKind::Jpeg);
        assert_eq!(reencode_kind(None), ImageKind::Jpeg);
    }

    #[test]
    fn quality_mapping_clamps() {
        assert_eq!(encoder_quality(0.0), 1);
        assert_eq!(encoder_quality(0.92), 92);
        assert_eq!(encoder_quality(2.0), 100);
    }
}
