// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for per-item failure status.
//
// Every technical error is mapped to a short plain-English line suitable for
// an inline status indicator, plus a suggestion. Nothing here retries:
// a failed item is re-triggered by the user.

use crate::error::BildwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input file itself is the problem (corrupt, wrong format).
    BadInput,
    /// The user asked for something impossible (zero size, nothing selected).
    ActionRequired,
    /// Something went wrong inside the pipeline or on disk.
    Internal,
}

/// A human-readable error with a short message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown next to the item).
    pub message: String,
    /// What the user could try.
    pub suggestion: String,
    /// Severity level (drives icon/colour in front ends).
    pub severity: Severity,
}

/// Convert a `BildwerkError` into a `HumanError`.
pub fn humanize_error(err: &BildwerkError) -> HumanError {
    match err {
        BildwerkError::Decode(_) => HumanError {
            message: "This file could not be read as an image.".into(),
            suggestion: "The file may be damaged or not an image. Try exporting it again.".into(),
            severity: Severity::BadInput,
        },

        BildwerkError::Conversion(detail) => HumanError {
            message: "Conversion failed.".into(),
            suggestion: if detail.contains("HEIC") {
                format!("HEIC/HEIF decoding is not available for this file. ({detail})")
            } else {
                format!("Try another output format. ({detail})")
            },
            severity: Severity::BadInput,
        },

        BildwerkError::Encode(detail) => HumanError {
            message: "The converted image could not be written.".into(),
            suggestion: format!("Try another output format or a different quality. ({detail})"),
            severity: Severity::Internal,
        },

        BildwerkError::Transform(_) => HumanError {
            message: "Editing failed.".into(),
            suggestion: "Try a different size or rotation.".into(),
            severity: Severity::Internal,
        },

        BildwerkError::ContextUnavailable(_) => HumanError {
            message: "The image is too large to process.".into(),
            suggestion: "Resize the image to a smaller size first.".into(),
            severity: Severity::ActionRequired,
        },

        BildwerkError::InvalidDimensions { width, height } => HumanError {
            message: "That size is not valid.".into(),
            suggestion: format!("Width and height must both be at least 1 pixel (got {width}x{height})."),
            severity: Severity::ActionRequired,
        },

        BildwerkError::UnsupportedFormat(detail) => HumanError {
            message: "This image format isn't supported.".into(),
            suggestion: format!("Supported inputs are HEIC, HEIF, PNG, JPG, WebP, GIF, BMP and TIFF. ({detail})"),
            severity: Severity::BadInput,
        },

        BildwerkError::EmptyInput(_) => HumanError {
            message: "There is nothing to export yet.".into(),
            suggestion: "Convert at least one image successfully, then export again.".into(),
            severity: Severity::ActionRequired,
        },

        BildwerkError::Archive(_) => HumanError {
            message: "Failed to create ZIP file.".into(),
            suggestion: "Try downloading the images one at a time.".into(),
            severity: Severity::Internal,
        },

        BildwerkError::Pdf(_) => HumanError {
            message: "Failed to create PDF.".into(),
            suggestion: "Try a different page format, or fewer images.".into(),
            severity: Severity::Internal,
        },

        BildwerkError::InvalidSetting(detail) => HumanError {
            message: "That setting could not be changed.".into(),
            suggestion: format!("Run `bildwerk config show` to see the valid keys and values. ({detail})"),
            severity: Severity::ActionRequired,
        },

        BildwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "File not found.".into(),
                suggestion: "Check the file path and try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Choose a folder you are allowed to write to.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file could not be read or written.".into(),
                suggestion: format!("Check free disk space and try again. ({io_err})"),
                severity: Severity::Internal,
            },
        },

        BildwerkError::Serialization(_) => HumanError {
            message: "Settings file is damaged.".into(),
            suggestion: "Run `bildwerk config reset` to restore the defaults.".into(),
            severity: Severity::Internal,
        },
    }
}
