// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bildwerk image converter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BildwerkError, Result};

/// Millimetres per pixel at 96 DPI. Used for "original" PDF page sizes.
pub const MM_PER_PIXEL: f32 = 0.264583;

/// Fixed quality used by resize/rotate/crop re-encoding.
pub const TRANSFORM_QUALITY: f32 = 0.92;

/// Unique identifier for a batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image container/coding kinds Bildwerk can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageKind {
    Heic,
    Heif,
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl ImageKind {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Infer the kind from a MIME type string (parameters are ignored).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/heic" | "image/heic-sequence" => Some(Self::Heic),
            "image/heif" | "image/heif-sequence" => Some(Self::Heif),
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Infer the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Infer the kind from the extension of a file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// HEIC and HEIF need the dedicated decode path.
    pub fn is_heif_family(&self) -> bool {
        matches!(self, Self::Heic | Self::Heif)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An encoded image payload plus its declared or inferred kind.
///
/// Immutable once produced; each operation consumes one and produces a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBytes {
    data: Vec<u8>,
    kind: Option<ImageKind>,
}

impl ImageBytes {
    pub fn new(data: Vec<u8>, kind: Option<ImageKind>) -> Self {
        Self { data, kind }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn kind(&self) -> Option<ImageKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBytes")
            .field("len", &self.data.len())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Pixel dimensions. Both sides are always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BildwerkError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Strictly wider than tall. Squares count as portrait.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn swapped(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Conversion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Png,
    Jpg,
    WebP,
}

impl TargetFormat {
    /// File extension. JPG is always "jpg", never "jpeg".
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Png => ImageKind::Png,
            Self::Jpg => ImageKind::Jpeg,
            Self::WebP => ImageKind::WebP,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind().mime_type()
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::WebP),
            other => Err(format!("unknown target format '{other}' (expected png, jpg, webp)")),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// User-facing encode quality, 1-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality as an encoder factor in `[0.01, 1.0]`.
    pub fn normalized(self) -> f32 {
        (self.0 as f32 / 100.0).clamp(0.01, 1.0)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// A format conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub format: TargetFormat,
    pub quality: Quality,
}

impl ConversionRequest {
    pub fn new(format: TargetFormat, quality: Quality) -> Self {
        Self { format, quality }
    }

    /// Encoder quality factor. PNG is lossless and always reports 1.0.
    pub fn effective_quality(&self) -> f32 {
        if self.format.is_lossless() {
            1.0
        } else {
            self.quality.normalized()
        }
    }
}

/// A resize request as entered by the user, before geometry resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
}

/// Clockwise right-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationAngle {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    /// Normalise any multiple of 90 degrees (negative means counter-clockwise).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Next angle after a quarter turn clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Next angle after a quarter turn counter-clockwise.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg270,
            Self::Deg90 => Self::Deg0,
            Self::Deg180 => Self::Deg90,
            Self::Deg270 => Self::Deg180,
        }
    }

    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Output dimensions of an image of `dims` rotated by this angle.
    pub fn apply(&self, dims: Dimensions) -> Dimensions {
        if self.swaps_dimensions() {
            dims.swapped()
        } else {
            dims
        }
    }
}

impl FromStr for RotationAngle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let degrees: i32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number of degrees"))?;
        Self::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be a multiple of 90 degrees, got {degrees}"))
    }
}

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// PDF page format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A4,
    Letter,
    /// Page size follows each image's pixel size at 96 DPI.
    Original,
}

impl PageFormat {
    /// Portrait page size in millimetres, `None` for [`PageFormat::Original`].
    pub fn dimensions_mm(&self) -> Option<(f32, f32)> {
        match self {
            Self::A4 => Some((210.0, 297.0)),
            Self::Letter => Some((215.9, 279.4)),
            Self::Original => None,
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "original" => Ok(Self::Original),
            other => Err(format!("unknown page format '{other}' (expected a4, letter, original)")),
        }
    }
}

/// Requested page orientation for a PDF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    Portrait,
    Landscape,
    /// Landscape for images wider than tall, portrait otherwise.
    Auto,
}

impl PageOrientation {
    /// Resolve the orientation of a page holding an image of `dims`.
    pub fn resolve(&self, dims: Dimensions) -> Orientation {
        match self {
            Self::Portrait => Orientation::Portrait,
            Self::Landscape => Orientation::Landscape,
            Self::Auto if dims.is_landscape() => Orientation::Landscape,
            Self::Auto => Orientation::Portrait,
        }
    }
}

impl FromStr for PageOrientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown orientation '{other}' (expected portrait, landscape, auto)"
            )),
        }
    }
}

/// Resolved page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// PDF export options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    pub format: PageFormat,
    pub orientation: PageOrientation,
    pub margin_mm: f32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            orientation: PageOrientation::Auto,
            margin_mm: 10.0,
        }
    }
}

/// Placement of one image on its page. All lengths are millimetres, offsets
/// are measured from the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub scaled_width: f32,
    pub scaled_height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Lifecycle of a batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// Added, not yet processed.
    Idle,
    /// Currently being converted.
    Converting,
    /// Converted; `result` and `output_name` are set.
    Success,
    /// Conversion failed; `error` holds a short message.
    Error,
}

/// One input file tracked through a batch conversion.
#[derive(Debug, Clone)]
pub struct FileItem {
    pub id: ItemId,
    /// Original file name as supplied by the user.
    pub name: String,
    pub source: ImageBytes,
    pub status: FileStatus,
    /// Percentage complete (0–100).
    pub progress: u8,
    pub result: Option<ImageBytes>,
    pub output_name: Option<String>,
    pub error: Option<String>,
}

impl FileItem {
    pub fn new(name: impl Into<String>, source: ImageBytes) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            source,
            status: FileStatus::Idle,
            progress: 0,
            result: None,
            output_name: None,
            error: None,
        }
    }

    pub fn is_converted(&self) -> bool {
        self.status == FileStatus::Success && self.result.is_some()
    }
}

/// Output file name for `original` converted to `format`.
///
/// The final extension is replaced; an empty stem falls back to
/// `converted_image`.
pub fn output_name(original: &str, format: TargetFormat) -> String {
    let stem = match original.rfind('.') {
        Some(dot) if !original[dot + 1..].is_empty() && !original[dot + 1..].contains('/') => {
            &original[..dot]
        }
        _ => original,
    };
    let stem = if stem.is_empty() { "converted_image" } else { stem };
    format!("{stem}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_reject_zero() {
        assert!(Dimensions::new(0, 10).is_err());
        assert!(Dimensions::new(10, 0).is_err());
        assert_eq!(Dimensions::new(3, 4).unwrap().swapped(), Dimensions::new(4, 3).unwrap());
    }

    #[test]
    fn quality_clamps_and_normalizes() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(250).value(), 100);
        assert_eq!(Quality::default().value(), 90);
        assert!((Quality::new(1).normalized() - 0.01).abs() < f32::EPSILON);
        assert!((Quality::new(100).normalized() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn png_request_is_always_lossless() {
        let low = ConversionRequest::new(TargetFormat::Png, Quality::new(1));
        let high = ConversionRequest::new(TargetFormat::Png, Quality::new(100));
        assert_eq!(low.effective_quality(), 1.0);
        assert_eq!(high.effective_quality(), 1.0);

        let jpg = ConversionRequest::new(TargetFormat::Jpg, Quality::new(50));
        assert!((jpg.effective_quality() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn rotation_swaps_only_quarter_turns() {
        let dims = Dimensions::new(300, 200).unwrap();
        assert_eq!(RotationAngle::Deg90.apply(dims), Dimensions::new(200, 300).unwrap());
        assert_eq!(RotationAngle::Deg270.apply(dims), Dimensions::new(200, 300).unwrap());
        assert_eq!(RotationAngle::Deg180.apply(dims), dims);
        assert_eq!(RotationAngle::Deg0.apply(dims), dims);
    }

    #[test]
    fn rotation_steps_wrap_around() {
        assert_eq!(RotationAngle::Deg270.clockwise(), RotationAngle::Deg0);
        assert_eq!(RotationAngle::Deg0.counter_clockwise(), RotationAngle::Deg270);
        assert_eq!(RotationAngle::from_degrees(-90), Some(RotationAngle::Deg270));
        assert_eq!(RotationAngle::from_degrees(450), Some(RotationAngle::Deg90));
        assert_eq!(RotationAngle::from_degrees(45), None);
        assert_eq!("180".parse::<RotationAngle>(), Ok(RotationAngle::Deg180));
    }

    #[test]
    fn kind_inference() {
        assert_eq!(ImageKind::from_mime("image/HEIC"), Some(ImageKind::Heic));
        assert_eq!(ImageKind::from_mime("image/jpeg; q=1"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("IMG_0001.HEIF"), Some(ImageKind::Heif));
        assert_eq!(ImageKind::from_file_name("archive.tar.gz"), None);
        assert_eq!(ImageKind::from_file_name("noext"), None);
    }

    #[test]
    fn output_names_replace_extension() {
        assert_eq!(output_name("IMG_0001.HEIC", TargetFormat::Jpg), "IMG_0001.jpg");
        assert_eq!(output_name("photo.final.png", TargetFormat::WebP), "photo.final.webp");
        assert_eq!(output_name("scan", TargetFormat::Png), "scan.png");
        assert_eq!(output_name(".heic", TargetFormat::Png), "converted_image.png");
        assert_eq!(output_name("", TargetFormat::Jpg), "converted_image.jpg");
    }

    #[test]
    fn auto_orientation_treats_square_as_portrait() {
        let square = Dimensions::new(500, 500).unwrap();
        let wide = Dimensions::new(501, 500).unwrap();
        assert_eq!(PageOrientation::Auto.resolve(square), Orientation::Portrait);
        assert_eq!(PageOrientation::Auto.resolve(wide), Orientation::Landscape);
        assert_eq!(PageOrientation::Portrait.resolve(wide), Orientation::Portrait);
    }

    #[test]
    fn target_format_parsing() {
        assert_eq!("JPEG".parse::<TargetFormat>(), Ok(TargetFormat::Jpg));
        assert_eq!(TargetFormat::Jpg.extension(), "jpg");
        assert!("gif".parse::<TargetFormat>().is_err());
    }
}
