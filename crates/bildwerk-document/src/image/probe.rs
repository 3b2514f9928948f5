// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dimension probe and kind detection.

use std::io::Cursor;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{Dimensions, ImageBytes, ImageKind};
use image::{ImageFormat, ImageReader};
use tracing::{debug, instrument};

/// `ftyp` major brands that identify HEIC (HEVC-coded) files.
const HEIC_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis"];

/// `ftyp` major brands of generic HEIF containers.
const HEIF_BRANDS: &[&[u8; 4]] = &[b"mif1", b"msf1", b"heif"];

/// Identify an image kind from its leading bytes.
pub fn sniff_kind(data: &[u8]) -> Option<ImageKind> {
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if HEIC_BRANDS.iter().any(|b| b.as_slice() == brand) {
            return Some(ImageKind::Heic);
        }
        if HEIF_BRANDS.iter().any(|b| b.as_slice() == brand) {
            return Some(ImageKind::Heif);
        }
    }
    image::guess_format(data).ok().and_then(kind_from_format)
}

/// Resolve the kind of an uploaded file.
///
/// Content sniffing wins; the declared MIME type and then the file name
/// extension are consulted only when the bytes are not recognised.
pub fn detect_kind(data: &[u8], mime: Option<&str>, file_name: Option<&str>) -> Option<ImageKind> {
    sniff_kind(data)
        .or_else(|| mime.and_then(ImageKind::from_mime))
        .or_else(|| file_name.and_then(ImageKind::from_file_name))
}

/// Wrap raw bytes, inferring their kind.
pub fn image_bytes(data: Vec<u8>, mime: Option<&str>, file_name: Option<&str>) -> ImageBytes {
    let kind = detect_kind(&data, mime, file_name);
    ImageBytes::new(data, kind)
}

/// Read the pixel size of an encoded image from its header.
///
/// HEIC/HEIF containers are not understood here; use
/// [`FormatConverter::probe`](crate::convert::FormatConverter::probe) for
/// those.
#[instrument(skip(image), fields(bytes_len = image.len()))]
pub fn probe(image: &ImageBytes) -> Result<Dimensions> {
    if image.kind().is_some_and(|k| k.is_heif_family()) {
        return Err(BildwerkError::Decode(
            "HEIC/HEIF containers need the HEIF decoder".into(),
        ));
    }

    let reader = ImageReader::new(Cursor::new(image.as_slice()))
        .with_guessed_format()
        .map_err(|err| BildwerkError::Decode(format!("failed to read image header: {err}")))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| BildwerkError::Decode(format!("failed to read image size: {err}")))?;

    debug!(width, height, "Probed image dimensions");
    Dimensions::new(width, height)
        .map_err(|_| BildwerkError::Decode(format!("image reports empty size {width}x{height}")))
}

pub(crate) fn kind_from_format(format: ImageFormat) -> Option<ImageKind> {
    match format {
        ImageFormat::Png => Some(ImageKind::Png),
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::WebP => Some(ImageKind::WebP),
        ImageFormat::Gif => Some(ImageKind::Gif),
        ImageFormat::Bmp => Some(ImageKind::Bmp),
        ImageFormat::Tiff => Some(ImageKind::Tiff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encoded, solid};

    #[test]
    fn probe_reads_png_size() {
        let png = encoded(&solid(120, 45, [10, 20, 30, 255]), ImageFormat::Png);
        let dims = probe(&ImageBytes::new(png, Some(ImageKind::Png))).unwrap();
        assert_eq!(dims, Dimensions::new(120, 45).unwrap());
    }

    #[test]
    fn probe_ignores_wrong_declared_kind() {
        let jpeg = encoded(&solid(64, 32, [200, 0, 0, 255]), ImageFormat::Jpeg);
        let dims = probe(&ImageBytes::new(jpeg, Some(ImageKind::Png))).unwrap();
        assert_eq!(dims, Dimensions::new(64, 32).unwrap());
    }

    #[test]
    fn probe_rejects_garbage() {
        let err = probe(&ImageBytes::new(b"definitely not pixels".to_vec(), None)).unwrap_err();
        assert!(matches!(err, BildwerkError::Decode(_)));
    }

    #[test]
    fn sniff_recognises_heic_brands() {
        let mut header = vec![0, 0, 0, 24];
        header.extend_from_slice(b"ftypheic");
        header.extend_from_slice(&[0; 12]);
        assert_eq!(sniff_kind(&header), Some(ImageKind::Heic));

        header[8..12].copy_from_slice(b"mif1");
        assert_eq!(sniff_kind(&header), Some(ImageKind::Heif));

        header[8..12].copy_from_slice(b"avif");
        assert_eq!(sniff_kind(&header), None);
    }

    #[test]
    fn detection_falls_back_to_mime_then_name() {
        assert_eq!(detect_kind(b"??", Some("image/heic"), None), Some(ImageKind::Heic));
        assert_eq!(detect_kind(b"??", None, Some("IMG_1.HEIF")), Some(ImageKind::Heif));
        assert_eq!(detect_kind(b"??", None, None), None);

        let png = encoded(&solid(2, 2, [0, 0, 0, 255]), ImageFormat::Png);
        assert_eq!(detect_kind(&png, Some("image/jpeg"), Some("x.webp")), Some(ImageKind::Png));
    }
}
