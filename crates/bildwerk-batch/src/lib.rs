// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk Batch: the serial task queue that runs image work off the async
// runtime, the per-file batch state machine, and ZIP/PDF exports of the
// converted results.

pub mod batch;
pub mod export;
pub mod queue;
pub mod task;

pub use batch::{Batch, BatchSummary};
pub use queue::{TaskEvent, TaskHandle, TaskQueue};
pub use task::{Operation, Task};
