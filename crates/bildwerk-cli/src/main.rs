// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk: local image converter.
//
// Entry point. Initialises logging, parses the command line, starts the
// backend services, and dispatches to a command handler.

mod commands;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use bildwerk_core::human_errors::humanize_error;
use bildwerk_core::{PageFormat, PageOrientation, RotationAngle, TargetFormat};
use clap::{Parser, Subcommand};

use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "bildwerk")]
#[command(about = "Convert HEIC, PNG, JPG and WebP images; resize, rotate, crop; export ZIP or PDF")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images to another format
    Convert {
        /// Input images
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target format: png, jpg, webp (default from settings)
        #[arg(long, short)]
        format: Option<TargetFormat>,
        /// Quality 1-100, ignored for PNG (default from settings)
        #[arg(long, short)]
        quality: Option<u8>,
        /// Directory for the converted files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Write one ZIP archive instead of individual files
        #[arg(long)]
        zip: bool,
    },
    /// Resize an image, keeping its format
    Resize {
        file: PathBuf,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Use width and height as given instead of preserving the aspect ratio
        #[arg(long)]
        stretch: bool,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Rotate an image clockwise by a multiple of 90 degrees
    Rotate {
        file: PathBuf,
        /// Degrees clockwise (negative turns counter-clockwise)
        #[arg(long, allow_negative_numbers = true)]
        angle: RotationAngle,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Cut a rectangle out of an image
    Crop {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        x: u32,
        #[arg(long, default_value_t = 0)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Print the pixel size and format of images
    Probe {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert images to JPG and lay them out one per page in a PDF
    Pdf {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// a4, letter, or original (default from settings)
        #[arg(long)]
        page_format: Option<PageFormat>,
        /// portrait, landscape, or auto (default from settings)
        #[arg(long)]
        orientation: Option<PageOrientation>,
        /// Margin in millimetres (default from settings)
        #[arg(long)]
        margin: Option<f32>,
        /// Output file (default: the configured PDF name inside --out-dir)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Directory for the PDF when --output is not given
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Show or change persistent settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings as JSON
    Show,
    /// Change one setting, e.g. `pdf.margin_mm 15`
    Set { key: String, value: String },
    /// Restore the default settings
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Bildwerk starting");

    let services = AppServices::init();
    let outcome = dispatch(&services, cli.command).await;
    services.shutdown().await;

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let human = humanize_error(&e);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `Ok(false)` means some items failed.
async fn dispatch(services: &AppServices, command: Command) -> bildwerk_core::error::Result<bool> {
    match command {
        Command::Convert {
            files,
            format,
            quality,
            out_dir,
            zip,
        } => commands::convert(services, &files, format, quality, &out_dir, zip).await,
        Command::Resize {
            file,
            width,
            height,
            stretch,
            output,
        } => commands::resize(services, &file, width, height, !stretch, &output).await,
        Command::Rotate {
            file,
            angle,
            output,
        } => commands::rotate(services, &file, angle, &output).await,
        Command::Crop {
            file,
            x,
            y,
            width,
            height,
            output,
        } => {
            let area = bildwerk_core::CropArea {
                x,
                y,
                width,
                height,
            };
            commands::crop(services, &file, area, &output).await
        }
        Command::Probe { files } => commands::probe(services, &files).await,
        Command::Pdf {
            files,
            page_format,
            orientation,
            margin,
            output,
            out_dir,
        } => {
            let mut options = services.config().pdf;
            if let Some(format) = page_format {
                options.format = format;
            }
            if let Some(orientation) = orientation {
                options.orientation = orientation;
            }
            if let Some(margin) = margin {
                options.margin_mm = margin;
            }
            commands::pdf(services, &files, options, output.as_deref(), &out_dir).await
        }
        Command::Config { action } => match action {
            ConfigAction::Show => commands::config_show(services),
            ConfigAction::Set { key, value } => commands::config_set(services, &key, &value),
            ConfigAction::Reset => commands::config_reset(services),
        },
    }
}
