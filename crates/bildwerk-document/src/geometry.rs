// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry calculator: resolves a user resize request against the original
// image size. Pure arithmetic, no I/O.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{Dimensions, ResizeRequest};
use tracing::debug;

/// Compute output dimensions for a resize request.
///
/// - Without aspect lock the missing side falls back to the original.
/// - With aspect lock and one side given, the other is derived from the
///   original ratio.
/// - With aspect lock and both sides given, the result is the largest size
///   that fits inside the requested box (fit-inside, never exceeding either
///   bound).
/// - With neither side given the original is returned unchanged.
///
/// A requested side of zero is rejected. A derived side that rounds to zero
/// (extreme aspect ratios) is clamped to one pixel.
pub fn compute_dimensions(
    original: Dimensions,
    target_width: Option<u32>,
    target_height: Option<u32>,
    maintain_aspect_ratio: bool,
) -> Result<Dimensions> {
    if target_width == Some(0) || target_height == Some(0) {
        return Err(BildwerkError::InvalidDimensions {
            width: target_width.unwrap_or(original.width),
            height: target_height.unwrap_or(original.height),
        });
    }

    let result = if !maintain_aspect_ratio {
        Dimensions {
            width: target_width.unwrap_or(original.width),
            height: target_height.unwrap_or(original.height),
        }
    } else {
        let ratio = original.aspect_ratio();
        match (target_width, target_height) {
            (Some(w), None) => Dimensions {
                width: w,
                height: round_side(w as f64 / ratio),
            },
            (None, Some(h)) => Dimensions {
                width: round_side(h as f64 * ratio),
                height: h,
            },
            (Some(w), Some(h)) => {
                if w as f64 / h as f64 > ratio {
                    // Requested box is wider than the image: height binds.
                    Dimensions {
                        width: round_side(h as f64 * ratio),
                        height: h,
                    }
                } else {
                    Dimensions {
                        width: w,
                        height: round_side(w as f64 / ratio),
                    }
                }
            }
            (None, None) => original,
        }
    };

    debug!(
        from = %original,
        to = %result,
        maintain_aspect_ratio,
        "Resolved resize dimensions"
    );
    Ok(result)
}

/// [`compute_dimensions`] driven by a [`ResizeRequest`].
pub fn resolve_resize(original: Dimensions, request: &ResizeRequest) -> Result<Dimensions> {
    compute_dimensions(
        original,
        request.width,
        request.height,
        request.maintain_aspect_ratio,
    )
}

fn round_side(value: f64) -> u32 {
    (value.round() as u32).max(1)
}
