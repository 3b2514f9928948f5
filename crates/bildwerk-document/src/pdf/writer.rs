// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: one page per image using `printpdf` 0.8.
//
// Layout is computed in millimetres from the top-left corner (see
// `layout.rs`); PDF user space starts at the bottom-left, so the vertical
// offset is flipped when the image is placed.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{Dimensions, ImageBytes, PageLayout, PdfOptions, TargetFormat};
use image::{DynamicImage, RgbImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::layout::layout_page;
use crate::convert::rasterize_for;
use crate::image::codec;

/// Images are embedded at 72 DPI so one pixel is one point before scaling.
const EMBED_DPI: f32 = 72.0;

/// Title written to the PDF /Info dictionary.
const DOCUMENT_TITLE: &str = "Converted Images";

/// A serialised PDF together with the layout of each page.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub layouts: Vec<PageLayout>,
}

/// Builds a multi-page PDF from raster images.
pub struct PdfWriter {
    options: PdfOptions,
}

impl PdfWriter {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    /// Render every image onto its own page, in order.
    #[instrument(skip(self, images), fields(images = images.len()))]
    pub fn render(&self, images: &[ImageBytes]) -> Result<RenderedPdf> {
        if images.is_empty() {
            return Err(BildwerkError::EmptyInput("no converted images to export".into()));
        }

        info!(format = ?self.options.format, orientation = ?self.options.orientation, "Creating image PDF");

        let mut doc = PdfDocument::new(DOCUMENT_TITLE);
        let mut pages = Vec::with_capacity(images.len());
        let mut layouts = Vec::with_capacity(images.len());

        for (index, source) in images.iter().enumerate() {
            let decoded = codec::decode(source).map_err(|err| {
                BildwerkError::Pdf(format!("image {} could not be read: {err}", index + 1))
            })?;
            let rgb = page_pixels(&decoded)?;
            let (px_w, px_h) = rgb.dimensions();
            let layout = layout_page(Dimensions::new(px_w, px_h)?, &self.options)?;

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: px_w as usize,
                height: px_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: placement(&layout, px_w, px_h),
            }];
            pages.push(PdfPage::new(
                Mm(layout.page_width_mm),
                Mm(layout.page_height_mm),
                ops,
            ));
            debug!(page = index + 1, ?layout, "Image placed on page");
            layouts.push(layout);
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialiser reported warnings");
        }
        if bytes.is_empty() {
            return Err(BildwerkError::Encode("PDF serialiser returned no data".into()));
        }

        info!(pages = layouts.len(), bytes = bytes.len(), "PDF created");
        Ok(RenderedPdf { bytes, layouts })
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(PdfOptions::default())
    }
}

/// Opaque RGB pixels for a page. Transparent areas show the white page.
fn page_pixels(decoded: &DynamicImage) -> Result<RgbImage> {
    Ok(rasterize_for(decoded, TargetFormat::Jpg)?.to_rgb8())
}

/// Transform that draws a `px_w` x `px_h` image into the layout's box.
fn placement(layout: &PageLayout, px_w: u32, px_h: u32) -> XObjectTransform {
    let target_w_pt = Mm(layout.scaled_width).into_pt().0;
    let target_h_pt = Mm(layout.scaled_height).into_pt().0;
    let bottom_mm = layout.page_height_mm - layout.y_offset - layout.scaled_height;

    XObjectTransform {
        translate_x: Some(Mm(layout.x_offset).into_pt()),
        translate_y: Some(Mm(bottom_mm).into_pt()),
        scale_x: Some(target_w_pt / px_w as f32),
        scale_y: Some(target_h_pt / px_h as f32),
        dpi: Some(EMBED_DPI),
        rotate: None,
    }
}
