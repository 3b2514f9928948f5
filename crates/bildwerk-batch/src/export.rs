// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exports of converted results. Only items in `Success` are included;
// serialisation runs on the blocking pool.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{FileItem, ImageBytes, PdfOptions};
use bildwerk_document::{PdfWriter, RenderedPdf, build_archive};
use tracing::{info, instrument};

/// `(output name, bytes)` for every converted item, in batch order.
pub fn converted_entries(items: &[FileItem]) -> Vec<(String, Vec<u8>)> {
    items
        .iter()
        .filter(|item| item.is_converted())
        .filter_map(|item| {
            let result = item.result.as_ref()?;
            let name = item.output_name.clone().unwrap_or_else(|| item.name.clone());
            Some((name, result.as_slice().to_vec()))
        })
        .collect()
}

/// ZIP archive of every converted result.
#[instrument(skip(items), fields(items = items.len()))]
pub async fn export_archive(items: &[FileItem]) -> Result<Vec<u8>> {
    let entries = converted_entries(items);
    let bytes = tokio::task::spawn_blocking(move || build_archive(&entries))
        .await
        .map_err(|err| BildwerkError::Archive(format!("archive task aborted: {err}")))??;
    info!(bytes = bytes.len(), "Archive exported");
    Ok(bytes)
}

/// PDF with one page per converted result.
#[instrument(skip(items), fields(items = items.len()))]
pub async fn export_pdf(items: &[FileItem], options: PdfOptions) -> Result<RenderedPdf> {
    let images: Vec<ImageBytes> = items
        .iter()
        .filter(|item| item.is_converted())
        .filter_map(|item| item.result.clone())
        .collect();
    let rendered = tokio::task::spawn_blocking(move || PdfWriter::new(options).render(&images))
        .await
        .map_err(|err| BildwerkError::Pdf(format!("PDF task aborted: {err}")))??;
    info!(pages = rendered.layouts.len(), "PDF exported");
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Batch;
    use crate::queue::TaskQueue;
    use crate::test_support::{garbage, png};
    use bildwerk_core::{ConversionRequest, Quality, TargetFormat};
    use bildwerk_document::FormatConverter;
    use std::io::Cursor;

    async fn converted_batch() -> Batch {
        let queue = TaskQueue::spawn(FormatConverter::default());
        let mut batch = Batch::new();
        batch.add("one.png", png(40, 30));
        batch.add("bad.png", garbage());
        batch.add("two.heic.png", png(30, 40));
        batch
            .convert_pending(&queue, ConversionRequest::new(TargetFormat::Jpg, Quality::new(80)))
            .await;
        queue.shutdown().await;
        batch
    }

    #[tokio::test]
    async fn archive_contains_only_converted_items() {
        let batch = converted_batch().await;
        let bytes = batch.export_archive().await.unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"one.jpg"));
        assert!(names.contains(&"two.heic.jpg"));
    }

    #[tokio::test]
    async fn pdf_has_a_page_per_converted_item() {
        let batch = converted_batch().await;
        let rendered = batch.export_pdf(PdfOptions::default()).await.unwrap();

        let doc = lopdf::Document::load_mem(&rendered.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn nothing_converted_is_empty_input() {
        let mut batch = Batch::new();
        batch.add("pending.png", png(4, 4));

        assert!(matches!(
            batch.export_archive().await,
            Err(BildwerkError::EmptyInput(_))
        ));
        assert!(matches!(
            batch.export_pdf(PdfOptions::default()).await,
            Err(BildwerkError::EmptyInput(_))
        ));
    }
}
