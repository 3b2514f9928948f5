// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page layout and multi-page image PDF creation.

pub mod layout;
pub mod writer;

pub use layout::{layout_page, layout_pages};
pub use writer::{PdfWriter, RenderedPdf};
