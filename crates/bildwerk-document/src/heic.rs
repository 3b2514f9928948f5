// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HEIC/HEIF decode-and-encode service.
//
// HEIF containers need a dedicated decoder (libheif). It is linked only when
// the `heic` feature is enabled; otherwise a codec that reports the missing
// support is used, so the rest of the pipeline stays unchanged.

use std::sync::Arc;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{Dimensions, TargetFormat};

/// Decode-and-encode service for HEIC/HEIF input.
pub trait HeicCodec: Send + Sync {
    /// Pixel size of the primary image.
    fn probe(&self, data: &[u8]) -> Result<Dimensions>;

    /// Decode `data` and re-encode as `target` at `quality` (0.01–1.0).
    ///
    /// Returns one encoded payload per decoded image; callers use the first.
    fn convert(&self, data: &[u8], target: TargetFormat, quality: f32) -> Result<Vec<Vec<u8>>>;
}

/// Stand-in used when Bildwerk is built without libheif.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableHeicCodec;

impl HeicCodec for UnavailableHeicCodec {
    fn probe(&self, _data: &[u8]) -> Result<Dimensions> {
        Err(BildwerkError::Decode(
            "HEIC support not built (enable the `heic` feature)".into(),
        ))
    }

    fn convert(&self, _data: &[u8], _target: TargetFormat, _quality: f32) -> Result<Vec<Vec<u8>>> {
        Err(BildwerkError::Conversion(
            "HEIC support not built (enable the `heic` feature)".into(),
        ))
    }
}

/// The best codec compiled into this build.
pub fn default_codec() -> Arc<dyn HeicCodec> {
    #[cfg(feature = "heic")]
    {
        Arc::new(libheif::LibHeifCodec)
    }
    #[cfg(not(feature = "heic"))]
    {
        Arc::new(UnavailableHeicCodec)
    }
}

/// Copy the visible RGBA pixels out of a plane whose rows may be padded to
/// `stride` bytes.
#[cfg_attr(not(feature = "heic"), allow(dead_code))]
fn packed_rgba_rows(data: &[u8], stride: usize, width: u32, height: u32) -> Result<Vec<u8>> {
    let row_len = width as usize * 4;
    if stride < row_len {
        return Err(BildwerkError::Conversion(format!(
            "HEIC plane stride {stride} is shorter than a {width}px row"
        )));
    }
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let row = data.get(start..start + row_len).ok_or_else(|| {
            BildwerkError::Conversion(format!("HEIC plane ends before row {y} of {height}"))
        })?;
        pixels.extend_from_slice(row);
    }
    Ok(pixels)
}

#[cfg(feature = "heic")]
pub use libheif::LibHeifCodec;

#[cfg(feature = "heic")]
mod libheif {
    use bildwerk_core::error::{BildwerkError, Result};
    use bildwerk_core::{Dimensions, TargetFormat};
    use image::{DynamicImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
    use tracing::{debug, instrument};

    use super::{HeicCodec, packed_rgba_rows};
    use crate::convert::rasterize_for;
    use crate::image::codec;

    /// libheif-backed codec. Decodes the primary image to RGBA.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibHeifCodec;

    impl LibHeifCodec {
        fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
            let lib_heif = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(data)
                .map_err(|e| BildwerkError::Conversion(format!("HEIC container: {e}")))?;
            let handle = ctx
                .primary_image_handle()
                .map_err(|e| BildwerkError::Conversion(format!("HEIC primary image: {e}")))?;

            let image = lib_heif
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
                .map_err(|e| BildwerkError::Conversion(format!("HEIC decode: {e}")))?;
            let planes = image.planes();
            let interleaved = planes.interleaved.ok_or_else(|| {
                BildwerkError::Conversion("HEIC decode produced no interleaved plane".into())
            })?;

            let (width, height) = (interleaved.width, interleaved.height);
            let pixels = packed_rgba_rows(interleaved.data, interleaved.stride, width, height)?;

            let rgba = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
                BildwerkError::Conversion("HEIC pixel buffer has the wrong size".into())
            })?;
            debug!(width, height, "HEIC image decoded");
            Ok(DynamicImage::ImageRgba8(rgba))
        }
    }

    impl HeicCodec for LibHeifCodec {
        fn probe(&self, data: &[u8]) -> Result<Dimensions> {
            let ctx = HeifContext::read_from_bytes(data)
                .map_err(|e| BildwerkError::Decode(format!("HEIC container: {e}")))?;
            let handle = ctx
                .primary_image_handle()
                .map_err(|e| BildwerkError::Decode(format!("HEIC primary image: {e}")))?;
            Dimensions::new(handle.width(), handle.height())
        }

        #[instrument(skip(self, data), fields(bytes_len = data.len()))]
        fn convert(&self, data: &[u8], target: TargetFormat, quality: f32) -> Result<Vec<Vec<u8>>> {
            let decoded = self.decode(data)?;
            let flattened = rasterize_for(&decoded, target)?;
            let encoded = codec::encode(&flattened, target.kind(), quality)?;
            Ok(vec![encoded])
        }
    }
}
