// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use thiserror::Error;

/// Top-level error type for all Bildwerk operations.
///
/// Every error is scoped to the single operation that raised it. Batch
/// processing turns each one into a per-item failure status instead of
/// aborting sibling items.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Pixel pipeline --
    #[error("could not read image: {0}")]
    Decode(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("encoder produced no output: {0}")]
    Encode(String),

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("drawing surface unavailable: {0}")]
    ContextUnavailable(String),

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    // -- Batch exports --
    #[error("nothing to export: {0}")]
    EmptyInput(String),

    #[error("archive creation failed: {0}")]
    Archive(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Settings --
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
