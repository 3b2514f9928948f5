// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout engine: one image per page, scaled to fit inside the margins
// and centred.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{Dimensions, MM_PER_PIXEL, Orientation, PageFormat, PageLayout, PdfOptions};
use tracing::debug;

/// Page size in millimetres for an image of `dims`, ordered to match
/// `orientation` (landscape puts the long side horizontally).
pub fn page_size_mm(format: PageFormat, orientation: Orientation, dims: Dimensions) -> (f32, f32) {
    let (w, h) = format.dimensions_mm().unwrap_or((
        dims.width as f32 * MM_PER_PIXEL,
        dims.height as f32 * MM_PER_PIXEL,
    ));
    let (short, long) = if w <= h { (w, h) } else { (h, w) };
    match orientation {
        Orientation::Portrait => (short, long),
        Orientation::Landscape => (long, short),
    }
}

/// Lay out a single image on its own page.
pub fn layout_page(dims: Dimensions, options: &PdfOptions) -> Result<PageLayout> {
    let orientation = options.orientation.resolve(dims);
    let (page_width_mm, page_height_mm) = page_size_mm(options.format, orientation, dims);

    let margin = options.margin_mm;
    if !margin.is_finite() || margin < 0.0 {
        return Err(BildwerkError::Pdf(format!("margin must be >= 0mm, got {margin}")));
    }
    let available_width = page_width_mm - margin * 2.0;
    let available_height = page_height_mm - margin * 2.0;
    if !(available_width > 0.0 && available_height > 0.0) {
        return Err(BildwerkError::Pdf(format!(
            "margin of {margin}mm leaves no room on a {page_width_mm:.1}x{page_height_mm:.1}mm page"
        )));
    }

    let image_ratio = dims.aspect_ratio() as f32;
    let page_ratio = available_width / available_height;

    let (scaled_width, scaled_height) = if image_ratio > page_ratio {
        (available_width, available_width / image_ratio)
    } else {
        (available_height * image_ratio, available_height)
    };

    let layout = PageLayout {
        orientation,
        page_width_mm,
        page_height_mm,
        scaled_width,
        scaled_height,
        x_offset: margin + (available_width - scaled_width) / 2.0,
        y_offset: margin + (available_height - scaled_height) / 2.0,
    };
    debug!(?layout, "Page laid out");
    Ok(layout)
}

/// Lay out every image on its own page, in order.
pub fn layout_pages(images: &[Dimensions], options: &PdfOptions) -> Result<Vec<PageLayout>> {
    if images.is_empty() {
        return Err(BildwerkError::EmptyInput("no converted images to export".into()));
    }
    images.iter().map(|dims| layout_page(*dims, options)).collect()
}
