// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial task queue.
//
// A single worker task pulls jobs off an unbounded channel and runs them one
// at a time on tokio's blocking pool, so at most one decode/encode is in
// flight and callers await results instead of blocking the runtime. Started
// and finished events go out on a broadcast channel for progress displays.
//
// There is no cancellation. Dropping a `TaskHandle` discards the result once
// it arrives; the worker still runs the task to completion.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{ImageBytes, ItemId};
use bildwerk_document::FormatConverter;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::task::Task;

/// Capacity of the event channel; slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 64;

/// Lifecycle notification for a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Started { id: ItemId },
    Finished { id: ItemId, ok: bool },
}

struct Job {
    task: Task,
    reply: oneshot::Sender<Result<ImageBytes>>,
}

/// Pending result of a submitted task.
pub struct TaskHandle {
    id: ItemId,
    receiver: oneshot::Receiver<Result<ImageBytes>>,
}

impl TaskHandle {
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Wait for the task to finish.
    pub async fn wait(self) -> Result<ImageBytes> {
        self.receiver.await.unwrap_or_else(|_| {
            Err(BildwerkError::ContextUnavailable(
                "task queue stopped before the task finished".into(),
            ))
        })
    }
}

/// Runs image tasks strictly in submission order on one worker.
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Job>,
    events: broadcast::Sender<TaskEvent>,
    worker: JoinHandle<()>,
}

impl TaskQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn spawn(converter: FormatConverter) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let worker = tokio::spawn(worker_loop(converter, receiver, events.clone()));
        info!("Task queue started");
        Self {
            sender,
            events,
            worker,
        }
    }

    /// Enqueue `task`. Fails only when the worker has stopped.
    #[instrument(skip(self, task), fields(id = %task.id, operation = task.operation.name()))]
    pub fn submit(&self, task: Task) -> Result<TaskHandle> {
        let id = task.id;
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(Job { task, reply })
            .map_err(|_| BildwerkError::ContextUnavailable("task queue has shut down".into()))?;
        debug!("Task queued");
        Ok(TaskHandle { id, receiver })
    }

    /// Enqueue `task` and wait for its result.
    pub async fn run(&self, task: Task) -> Result<ImageBytes> {
        self.submit(task)?.wait().await
    }

    /// Receive lifecycle events for tasks submitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Stop accepting work, let queued tasks finish, and wait for the worker.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(err) = self.worker.await {
            warn!("task queue worker ended abnormally: {err}");
        }
        info!("Task queue stopped");
    }
}

async fn worker_loop(
    converter: FormatConverter,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    events: broadcast::Sender<TaskEvent>,
) {
    while let Some(Job { task, reply }) = receiver.recv().await {
        let id = task.id;
        // Send errors only mean nobody is listening.
        let _ = events.send(TaskEvent::Started { id });

        let converter = converter.clone();
        let result = tokio::task::spawn_blocking(move || task.run(&converter))
            .await
            .unwrap_or_else(|err| {
                Err(BildwerkError::ContextUnavailable(format!("image task aborted: {err}")))
            });

        let ok = result.is_ok();
        if let Err(ref err) = result {
            warn!(%id, "Task failed: {err}");
        }
        let _ = events.send(TaskEvent::Finished { id, ok });

        if reply.send(result).is_err() {
            debug!(%id, "Result discarded, handle was dropped");
        }
    }
}
