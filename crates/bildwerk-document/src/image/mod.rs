// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: format detection, decode/encode, drawing surfaces, and the
// resize/rotate/crop transforms.

pub mod codec;
pub mod probe;
pub mod processor;
pub mod surface;

pub use probe::{detect_kind, image_bytes, probe, sniff_kind};
pub use processor::ImageProcessor;
pub use surface::Surface;
