// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Units of work accepted by the task queue.

use bildwerk_core::error::Result;
use bildwerk_core::{ConversionRequest, CropArea, ImageBytes, ItemId, ResizeRequest, RotationAngle};
use bildwerk_document::{FormatConverter, crop, resize_with, rotate};

/// What to do with an image.
#[derive(Debug, Clone)]
pub enum Operation {
    Convert(ConversionRequest),
    Resize(ResizeRequest),
    Rotate(RotationAngle),
    Crop(CropArea),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convert(_) => "convert",
            Self::Resize(_) => "resize",
            Self::Rotate(_) => "rotate",
            Self::Crop(_) => "crop",
        }
    }
}

/// An operation bound to its input.
#[derive(Debug, Clone)]
pub struct Task {
    /// Identifier reported in queue events.
    pub id: ItemId,
    pub source: ImageBytes,
    pub operation: Operation,
}

impl Task {
    pub fn new(id: ItemId, source: ImageBytes, operation: Operation) -> Self {
        Self {
            id,
            source,
            operation,
        }
    }

    /// Run synchronously on the calling thread.
    pub fn run(self, converter: &FormatConverter) -> Result<ImageBytes> {
        match self.operation {
            Operation::Convert(request) => converter.convert(&self.source, &request),
            Operation::Resize(request) => resize_with(&self.source, &request),
            Operation::Rotate(angle) => rotate(self.source, angle),
            Operation::Crop(area) => crop(&self.source, area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png;
    use bildwerk_core::{Dimensions, ImageKind, Quality, TargetFormat};
    use bildwerk_document::image::probe;

    #[test]
    fn runs_each_operation() {
        let converter = FormatConverter::default();
        let id = ItemId::new();

        let jpg = Task::new(
            id,
            png(20, 10),
            Operation::Convert(ConversionRequest::new(TargetFormat::Jpg, Quality::new(80))),
        )
        .run(&converter)
        .unwrap();
        assert_eq!(jpg.kind(), Some(ImageKind::Jpeg));

        let rotated = Task::new(id, png(20, 10), Operation::Rotate(RotationAngle::Deg90))
            .run(&converter)
            .unwrap();
        assert_eq!(probe(&rotated).unwrap(), Dimensions::new(10, 20).unwrap());

        let resized = Task::new(
            id,
            png(20, 10),
            Operation::Resize(ResizeRequest {
                width: None,
                height: Some(5),
                maintain_aspect_ratio: true,
            }),
        )
        .run(&converter)
        .unwrap();
        assert_eq!(probe(&resized).unwrap(), Dimensions::new(10, 5).unwrap());

        let cropped = Task::new(
            id,
            png(20, 10),
            Operation::Crop(CropArea {
                x: 5,
                y: 0,
                width: 10,
                height: 10,
            }),
        )
        .run(&converter)
        .unwrap();
        assert_eq!(probe(&cropped).unwrap(), Dimensions::new(10, 10).unwrap());
    }

    #[test]
    fn operation_names() {
        assert_eq!(Operation::Rotate(RotationAngle::Deg180).name(), "rotate");
    }
}
