// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform engine: resize, rotate, and crop. Each edit draws into a fresh
// surface at the output size and re-encodes in the source's format at a
// fixed quality of 0.92.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{
    CropArea, Dimensions, ImageBytes, ImageKind, ResizeRequest, RotationAngle, TRANSFORM_QUALITY,
};
use image::imageops;
use image::DynamicImage;
use tracing::{debug, info, instrument};

use super::codec::{self, reencode_kind};
use super::probe::{probe, sniff_kind};
use super::surface::Surface;
use crate::geometry::resolve_resize;

/// Image processing pipeline operating on a single decoded image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let bytes = ImageProcessor::from_bytes(&source)?
///     .rotate(RotationAngle::Deg90)?
///     .resize(Dimensions::new(400, 300)?)?
///     .encode()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
    /// Kind of the original input, preserved on encode.
    source_kind: Option<ImageKind>,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an encoded image.
    pub fn from_bytes(source: &ImageBytes) -> Result<Self> {
        let image = codec::decode(source)?;
        let source_kind = source.kind().or_else(|| sniff_kind(source.as_slice()));
        Ok(Self { image, source_kind })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage, source_kind: Option<ImageKind>) -> Self {
        Self { image, source_kind }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Draw the image scaled to exactly `target`. Aspect ratio is the
    /// caller's concern (see [`crate::geometry`]).
    #[instrument(skip(self), fields(target = %target))]
    pub fn resize(self, target: Dimensions) -> Result<Self> {
        info!(from = %self.dimensions(), "Resizing image");
        let mut surface = Surface::allocate(target)?;
        surface.draw_scaled(&self.image);
        Ok(Self {
            image: surface.into_image(),
            source_kind: self.source_kind,
        })
    }

    /// Rotate clockwise by a right angle. 90 and 270 swap width and height.
    #[instrument(skip(self), fields(degrees = angle.degrees()))]
    pub fn rotate(self, angle: RotationAngle) -> Result<Self> {
        if angle == RotationAngle::Deg0 {
            return Ok(self);
        }
        let target = angle.apply(self.dimensions());
        let mut surface = Surface::allocate(target)?;

        let rgba = self.image.to_rgba8();
        let rotated = match angle {
            RotationAngle::Deg90 => imageops::rotate90(&rgba),
            RotationAngle::Deg180 => imageops::rotate180(&rgba),
            RotationAngle::Deg270 => imageops::rotate270(&rgba),
            RotationAngle::Deg0 => rgba,
        };
        surface.paint(&rotated);

        debug!(to = %target, "Rotation applied");
        Ok(Self {
            image: surface.into_image(),
            source_kind: self.source_kind,
        })
    }

    /// Cut out `area`. The rectangle is clamped to the image bounds; a
    /// rectangle that misses the image entirely is rejected.
    #[instrument(skip(self), fields(x = area.x, y = area.y, width = area.width, height = area.height))]
    pub fn crop(self, area: CropArea) -> Result<Self> {
        let Dimensions { width, height } = self.dimensions();
        let safe_w = area.width.min(width.saturating_sub(area.x));
        let safe_h = area.height.min(height.saturating_sub(area.y));
        let target = Dimensions::new(safe_w, safe_h)?;

        let mut surface = Surface::allocate(target)?;
        let rgba = self.image.to_rgba8();
        let region = imageops::crop_imm(&rgba, area.x, area.y, safe_w, safe_h).to_image();
        surface.paint(&region);

        info!(to = %target, "Cropped image");
        Ok(Self {
            image: surface.into_image(),
            source_kind: self.source_kind,
        })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode in the source's format (JPEG when unknown) at quality 0.92.
    pub fn encode(&self) -> Result<ImageBytes> {
        let kind = reencode_kind(self.source_kind);
        let data = codec::encode(&self.image, kind, TRANSFORM_QUALITY)?;
        Ok(ImageBytes::new(data, Some(kind)))
    }
}

// -- One-shot operations -------------------------------------------------------

/// Resize `source` to exactly `target`.
pub fn resize(source: &ImageBytes, target: Dimensions) -> Result<ImageBytes> {
    ImageProcessor::from_bytes(source)
        .and_then(|p| p.resize(target))
        .and_then(|p| p.encode())
        .map_err(into_transform_error)
}

/// Resolve `request` against the source's size, then resize.
pub fn resize_with(source: &ImageBytes, request: &ResizeRequest) -> Result<ImageBytes> {
    let original = probe(source).map_err(into_transform_error)?;
    let target = resolve_resize(original, request)?;
    resize(source, target)
}

/// Rotate `source` clockwise. A zero angle returns the input untouched.
pub fn rotate(source: ImageBytes, angle: RotationAngle) -> Result<ImageBytes> {
    if angle == RotationAngle::Deg0 {
        return Ok(source);
    }
    ImageProcessor::from_bytes(&source)
        .and_then(|p| p.rotate(angle))
        .and_then(|p| p.encode())
        .map_err(into_transform_error)
}

/// Crop `source` to `area`.
pub fn crop(source: &ImageBytes, area: CropArea) -> Result<ImageBytes> {
    ImageProcessor::from_bytes(source)
        .and_then(|p| p.crop(area))
        .and_then(|p| p.encode())
        .map_err(into_transform_error)
}

/// Decode and encode failures inside a transform surface as `Transform`;
/// surface and geometry errors keep their own kind.
fn into_transform_error(err: BildwerkError) -> BildwerkError {
    match err {
        BildwerkError::Decode(detail)
        | BildwerkError::Encode(detail)
        | BildwerkError::UnsupportedFormat(detail) => BildwerkError::Transform(detail),
        other => other,
    }
}
