// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and the process-wide settings store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::error::{BildwerkError, Result};
use crate::types::{PageFormat, PageOrientation, PdfOptions, Quality, TargetFormat};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target format pre-selected for new conversions.
    pub default_format: TargetFormat,
    /// Quality pre-selected for new conversions (ignored for PNG).
    pub default_quality: Quality,
    /// PDF export defaults.
    pub pdf: PdfOptions,
    /// File name used for batch ZIP downloads.
    pub archive_name: String,
    /// File name used for PDF exports.
    pub pdf_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_format: TargetFormat::Jpg,
            default_quality: Quality::default(),
            pdf: PdfOptions::default(),
            archive_name: "converted_images.zip".into(),
            pdf_name: "images.pdf".into(),
        }
    }
}

impl AppConfig {
    /// Set a single setting from its `key` and string `value`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |msg: String| BildwerkError::InvalidSetting(msg);
        match key {
            "default_format" => self.default_format = value.parse::<TargetFormat>().map_err(invalid)?,
            "default_quality" => {
                let q: u8 = value
                    .parse()
                    .map_err(|_| invalid(format!("quality must be 1-100, got '{value}'")))?;
                self.default_quality = Quality::new(q);
            }
            "pdf.format" => self.pdf.format = value.parse::<PageFormat>().map_err(invalid)?,
            "pdf.orientation" => {
                self.pdf.orientation = value.parse::<PageOrientation>().map_err(invalid)?
            }
            "pdf.margin_mm" => {
                let margin: f32 = value
                    .parse()
                    .map_err(|_| invalid(format!("margin must be a number, got '{value}'")))?;
                if !margin.is_finite() || margin < 0.0 {
                    return Err(invalid(format!("margin must be >= 0, got {margin}")));
                }
                self.pdf.margin_mm = margin;
            }
            "archive_name" => self.archive_name = value.to_string(),
            "pdf_name" => self.pdf_name = value.to_string(),
            other => return Err(invalid(format!("unknown setting '{other}'"))),
        }
        Ok(())
    }
}

/// The single process-wide owner of [`AppConfig`].
///
/// Loaded once at startup, mutated only through [`ConfigStore::update`], and
/// observed through [`ConfigStore::subscribe`]. Updates are persisted before
/// they are broadcast.
pub struct ConfigStore {
    /// Backing JSON file. `None` keeps the store in memory only.
    path: Option<PathBuf>,
    sender: watch::Sender<AppConfig>,
}

impl ConfigStore {
    /// Load the settings file at `path`, or start from defaults when it does
    /// not exist yet.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<AppConfig>(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings file, using defaults");
                AppConfig::default()
            }
            Err(err) => return Err(err.into()),
        };
        info!(format = %config.default_format, quality = config.default_quality.value(), "settings loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            sender: watch::Sender::new(config),
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            path: None,
            sender: watch::Sender::new(config),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of the current settings.
    pub fn current(&self) -> AppConfig {
        self.sender.borrow().clone()
    }

    /// Apply `mutate` to a copy of the settings, persist it, then publish it.
    ///
    /// When persisting fails, nothing is published and the previous settings
    /// stay in effect.
    pub fn update(&self, mutate: impl FnOnce(&mut AppConfig) -> Result<()>) -> Result<AppConfig> {
        let mut next = self.current();
        mutate(&mut next)?;
        if let Some(ref path) = self.path {
            save_config(path, &next)?;
        }
        self.sender.send_replace(next.clone());
        debug!("settings updated");
        Ok(next)
    }

    /// Restore the defaults (persisted like any other update).
    pub fn reset(&self) -> Result<AppConfig> {
        self.update(|config| {
            *config = AppConfig::default();
            Ok(())
        })
    }

    /// Observe future updates.
    pub fn subscribe(&self) -> watch::Receiver<AppConfig> {
        self.sender.subscribe()
    }
}

fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
