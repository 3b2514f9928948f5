// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns the settings store and the task queue for the
// lifetime of one command.

use std::path::{Path, PathBuf};

use bildwerk_batch::TaskQueue;
use bildwerk_core::error::Result;
use bildwerk_core::{AppConfig, ConfigStore};
use bildwerk_document::FormatConverter;
use tracing::{info, warn};

use super::data_dir;

/// Backend services shared by every command handler.
pub struct AppServices {
    config: ConfigStore,
    queue: TaskQueue,
    converter: FormatConverter,
}

impl AppServices {
    /// Initialise all services. Must run inside the tokio runtime.
    ///
    /// Settings come from the data directory; an unreadable settings file is
    /// logged and replaced by defaults for this run.
    pub fn init() -> Self {
        Self::with_config_path(&data_dir::config_path())
    }

    pub fn with_config_path(path: &Path) -> Self {
        info!(path = %path.display(), "initialising app services");
        let config = match ConfigStore::load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("settings unreadable, using defaults: {e}");
                ConfigStore::in_memory(AppConfig::default())
            }
        };
        let converter = FormatConverter::with_default_codec();
        let queue = TaskQueue::spawn(converter.clone());
        Self {
            config,
            queue,
            converter,
        }
    }

    pub fn config(&self) -> AppConfig {
        self.config.current()
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.path().map(Path::to_path_buf)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<AppConfig> {
        self.config.update(|config| config.set(key, value))
    }

    pub fn reset_config(&self) -> Result<AppConfig> {
        self.config.reset()
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn converter(&self) -> &FormatConverter {
        &self.converter
    }

    /// Let queued work finish before the process exits.
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }
}
