// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch state: the list of files the user added and where each one is in
// its idle → converting → success/error lifecycle.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::human_errors::humanize_error;
use bildwerk_core::{
    ConversionRequest, FileItem, FileStatus, ImageBytes, ItemId, PdfOptions, output_name,
};
use bildwerk_document::RenderedPdf;
use bildwerk_document::image::image_bytes;
use tracing::{info, instrument, warn};

use crate::export;
use crate::queue::TaskQueue;
use crate::task::{Operation, Task};

/// Outcome counts for one `convert_pending` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
    /// Items already converted by an earlier pass.
    pub skipped: usize,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Ordered collection of files being converted.
#[derive(Debug, Default)]
pub struct Batch {
    items: Vec<FileItem>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already-typed payload.
    pub fn add(&mut self, name: impl Into<String>, source: ImageBytes) -> ItemId {
        let item = FileItem::new(name, source);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Add raw file bytes, detecting the kind from content, MIME type, then name.
    pub fn add_file(&mut self, name: impl Into<String>, data: Vec<u8>, mime: Option<&str>) -> ItemId {
        let name = name.into();
        let source = image_bytes(data, mime, Some(&name));
        self.add(name, source)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<FileItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[FileItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&FileItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items that have a converted result.
    pub fn converted(&self) -> impl Iterator<Item = &FileItem> {
        self.items.iter().filter(|item| item.is_converted())
    }

    /// Convert every item not already in `Success`, one at a time.
    ///
    /// A failing item is marked `Error` with a short message and never stops
    /// the rest of the batch.
    #[instrument(skip(self, queue), fields(items = self.items.len(), format = %request.format))]
    pub async fn convert_pending(
        &mut self,
        queue: &TaskQueue,
        request: ConversionRequest,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for item in &mut self.items {
            if item.status == FileStatus::Success {
                summary.skipped += 1;
                continue;
            }

            item.status = FileStatus::Converting;
            item.progress = 0;
            item.error = None;

            let task = Task::new(item.id, item.source.clone(), Operation::Convert(request));
            match queue.run(task).await {
                Ok(result) => {
                    item.output_name = Some(output_name(&item.name, request.format));
                    item.result = Some(result);
                    item.status = FileStatus::Success;
                    item.progress = 100;
                    summary.converted += 1;
                }
                Err(err) => {
                    warn!(name = %item.name, "Conversion failed: {err}");
                    item.error = Some(humanize_error(&err).message);
                    item.result = None;
                    item.output_name = None;
                    item.status = FileStatus::Error;
                    item.progress = 0;
                    summary.failed += 1;
                }
            }
        }

        info!(?summary, "Batch conversion finished");
        summary
    }

    /// Apply `operation` to a converted item's result, replacing it.
    #[instrument(skip(self, queue), fields(%id, operation = operation.name()))]
    pub async fn edit(&mut self, queue: &TaskQueue, id: ItemId, operation: Operation) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| BildwerkError::Transform(format!("no item with id {id}")))?;
        let current = match (&item.result, item.status) {
            (Some(result), FileStatus::Success) => result.clone(),
            _ => {
                return Err(BildwerkError::Transform(format!(
                    "{} has not been converted yet",
                    item.name
                )));
            }
        };

        let renamed = match &operation {
            Operation::Convert(request) => Some(output_name(&item.name, request.format)),
            _ => None,
        };
        let edited = queue.run(Task::new(id, current, operation)).await?;
        item.result = Some(edited);
        if let Some(name) = renamed {
            item.output_name = Some(name);
        }
        info!(name = %item.name, "Item edited");
        Ok(())
    }

    /// ZIP of every converted result under its output name.
    pub async fn export_archive(&self) -> Result<Vec<u8>> {
        export::export_archive(self.items()).await
    }

    /// One-page-per-image PDF of every converted result.
    pub async fn export_pdf(&self, options: PdfOptions) -> Result<RenderedPdf> {
        export::export_pdf(self.items(), options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{garbage, png};
    use bildwerk_core::{Dimensions, ImageKind, Quality, RotationAngle, TargetFormat};
    use bildwerk_document::FormatConverter;
    use bildwerk_document::image::probe;

    fn jpg_request() -> ConversionRequest {
        ConversionRequest::new(TargetFormat::Jpg, Quality::new(85))
    }

    #[tokio::test]
    async fn failures_do_not_stop_siblings() {
        let queue = TaskQueue::spawn(FormatConverter::default());
        let mut batch = Batch::new();
        let good = batch.add("holiday.png", png(30, 20));
        let bad = batch.add("broken.png", garbage());
        let other = batch.add("scan.png", png(10, 10));

        let summary = batch.convert_pending(&queue, jpg_request()).await;
        assert_eq!(
            summary,
            BatchSummary {
                converted: 2,
                failed: 1,
                skipped: 0
            }
        );
        assert!(!summary.all_succeeded());

        let good = batch.get(good).unwrap();
        assert_eq!(good.status, FileStatus::Success);
        assert_eq!(good.progress, 100);
        assert_eq!(good.output_name.as_deref(), Some("holiday.jpg"));
        assert_eq!(good.result.as_ref().unwrap().kind(), Some(ImageKind::Jpeg));

        let bad = batch.get(bad).unwrap();
        assert_eq!(bad.status, FileStatus::Error);
        assert!(bad.result.is_none());
        assert!(!bad.error.as_deref().unwrap_or_default().is_empty());

        assert_eq!(batch.get(other).unwrap().status, FileStatus::Success);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn second_pass_skips_converted_items() {
        let queue = TaskQueue::spawn(FormatConverter::default());
        let mut batch = Batch::new();
        batch.add("a.png", png(8, 8));
        batch.add("b.png", garbage());

        batch.convert_pending(&queue, jpg_request()).await;
        let again = batch.convert_pending(&queue, jpg_request()).await;
        assert_eq!(again.skipped, 1);
        assert_eq!(again.failed, 1);
        assert_eq!(again.converted, 0);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn add_file_detects_kind_from_content() {
        let mut batch = Batch::new();
        let id = batch.add_file("mystery.bin", png(2, 2).into_inner(), None);
        assert_eq!(batch.get(id).unwrap().source.kind(), Some(ImageKind::Png));
        assert_eq!(batch.len(), 1);
        assert!(batch.remove(id).is_some());
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn edit_rotates_converted_result() {
        let queue = TaskQueue::spawn(FormatConverter::default());
        let mut batch = Batch::new();
        let id = batch.add("wide.png", png(40, 20));

        let err = batch
            .edit(&queue, id, Operation::Rotate(RotationAngle::Deg90))
            .await
            .unwrap_err();
        assert!(matches!(err, BildwerkError::Transform(_)));

        batch.convert_pending(&queue, jpg_request()).await;
        batch
            .edit(&queue, id, Operation::Rotate(RotationAngle::Deg90))
            .await
            .unwrap();

        let result = batch.get(id).unwrap().result.as_ref().unwrap();
        assert_eq!(probe(result).unwrap(), Dimensions::new(20, 40).unwrap());
        assert_eq!(result.kind(), Some(ImageKind::Jpeg));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn edit_with_convert_renames_output() {
        let queue = TaskQueue::spawn(FormatConverter::default());
        let mut batch = Batch::new();
        let id = batch.add("photo.png", png(6, 6));
        batch.convert_pending(&queue, jpg_request()).await;

        let to_png = ConversionRequest::new(TargetFormat::Png, Quality::default());
        batch.edit(&queue, id, Operation::Convert(to_png)).await.unwrap();
        assert_eq!(
            batch.get(id).unwrap().output_name.as_deref(),
            Some("photo.png")
        );
        queue.shutdown().await;
    }
}
