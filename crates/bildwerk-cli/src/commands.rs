// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command handlers. Each returns `Ok(false)` when at least one input failed;
// per-file failures are printed inline and never abort the remaining files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bildwerk_batch::{Batch, Operation, Task};
use bildwerk_core::error::Result;
use bildwerk_core::human_errors::humanize_error;
use bildwerk_core::{
    ConversionRequest, CropArea, FileStatus, ImageBytes, ItemId, PdfOptions, Quality,
    ResizeRequest, RotationAngle, TargetFormat,
};
use bildwerk_document::image::{image_bytes, probe as probe_dimensions};
use bildwerk_document::unique_name;
use tracing::{info, warn};

use crate::services::app_services::AppServices;

// -- Batch commands -----------------------------------------------------------

pub async fn convert(
    services: &AppServices,
    files: &[PathBuf],
    format: Option<TargetFormat>,
    quality: Option<u8>,
    out_dir: &Path,
    zip: bool,
) -> Result<bool> {
    let config = services.config();
    let request = ConversionRequest::new(
        format.unwrap_or(config.default_format),
        quality.map(Quality::new).unwrap_or(config.default_quality),
    );

    let (mut batch, unreadable) = load_batch(files).await;
    let summary = batch.convert_pending(services.queue(), request).await;
    print_statuses(&batch);

    if batch.converted().next().is_none() {
        println!("nothing converted");
        return Ok(false);
    }

    tokio::fs::create_dir_all(out_dir).await?;
    if zip {
        let archive = batch.export_archive().await?;
        let path = out_dir.join(&config.archive_name);
        tokio::fs::write(&path, &archive).await?;
        println!("wrote {} ({} bytes)", path.display(), archive.len());
    } else {
        let mut taken = inputs_in_dir(out_dir, files).await;
        for item in batch.converted() {
            if let (Some(wanted), Some(result)) = (&item.output_name, &item.result) {
                let name = unique_name(wanted, &taken);
                let path = out_dir.join(&name);
                tokio::fs::write(&path, result.as_slice()).await?;
                if name != *wanted {
                    println!("saved {} as {name}", item.name);
                }
                info!(path = %path.display(), "converted file written");
                taken.insert(name);
            }
        }
    }

    println!(
        "{} converted, {} failed",
        summary.converted,
        summary.failed + unreadable
    );
    Ok(summary.all_succeeded() && unreadable == 0)
}

/// Without `output`, the PDF is written to `out_dir` under the configured name.
pub async fn pdf(
    services: &AppServices,
    files: &[PathBuf],
    options: PdfOptions,
    output: Option<&Path>,
    out_dir: &Path,
) -> Result<bool> {
    let config = services.config();
    // Pages embed JPG, like the converted results they are built from.
    let request = ConversionRequest::new(TargetFormat::Jpg, config.default_quality);

    let (mut batch, unreadable) = load_batch(files).await;
    let summary = batch.convert_pending(services.queue(), request).await;
    print_statuses(&batch);

    let rendered = batch.export_pdf(options).await?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            tokio::fs::create_dir_all(out_dir).await?;
            out_dir.join(&config.pdf_name)
        }
    };
    tokio::fs::write(&path, &rendered.bytes).await?;
    println!(
        "wrote {} ({} pages, {} bytes)",
        path.display(),
        rendered.layouts.len(),
        rendered.bytes.len()
    );
    Ok(summary.all_succeeded() && unreadable == 0)
}

pub async fn probe(services: &AppServices, files: &[PathBuf]) -> Result<bool> {
    let mut all_ok = true;
    for path in files {
        let name = display_name(path);
        let outcome = match tokio::fs::read(path).await {
            Ok(data) => {
                let source = image_bytes(data, None, Some(&name));
                services
                    .converter()
                    .probe(&source)
                    .map(|dims| (dims, source.kind()))
            }
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok((dims, kind)) => {
                let kind = kind.map(|k| k.to_string()).unwrap_or_else(|| "unknown".into());
                println!("{name}\t{dims}\t{kind}");
            }
            Err(e) => {
                all_ok = false;
                println!("{name}\tFAILED: {}", humanize_error(&e).message);
            }
        }
    }
    Ok(all_ok)
}

// -- Single-image edits --------------------------------------------------------

pub async fn resize(
    services: &AppServices,
    file: &Path,
    width: Option<u32>,
    height: Option<u32>,
    maintain_aspect_ratio: bool,
    output: &Path,
) -> Result<bool> {
    let request = ResizeRequest {
        width,
        height,
        maintain_aspect_ratio,
    };
    edit_one(services, file, Operation::Resize(request), output).await
}

pub async fn rotate(
    services: &AppServices,
    file: &Path,
    angle: RotationAngle,
    output: &Path,
) -> Result<bool> {
    edit_one(services, file, Operation::Rotate(angle), output).await
}

pub async fn crop(services: &AppServices, file: &Path, area: CropArea, output: &Path) -> Result<bool> {
    edit_one(services, file, Operation::Crop(area), output).await
}

async fn edit_one(
    services: &AppServices,
    file: &Path,
    operation: Operation,
    output: &Path,
) -> Result<bool> {
    let name = display_name(file);
    let source = image_bytes(tokio::fs::read(file).await?, None, Some(&name));
    let task = Task::new(ItemId::new(), source, operation);
    let result = services.queue().run(task).await?;

    tokio::fs::write(output, result.as_slice()).await?;
    match probe_dimensions(&result) {
        Ok(dims) => println!("wrote {} ({dims})", output.display()),
        Err(_) => println!("wrote {}", output.display()),
    }
    Ok(true)
}

// -- Settings -------------------------------------------------------------------

pub fn config_show(services: &AppServices) -> Result<bool> {
    let json = serde_json::to_string_pretty(&services.config())?;
    println!("{json}");
    if let Some(path) = services.config_path() {
        println!("# {}", path.display());
    }
    Ok(true)
}

pub fn config_set(services: &AppServices, key: &str, value: &str) -> Result<bool> {
    services.set_config(key, value)?;
    println!("{key} = {value}");
    Ok(true)
}

pub fn config_reset(services: &AppServices) -> Result<bool> {
    services.reset_config()?;
    println!("settings restored to defaults");
    Ok(true)
}

// -- Helpers --------------------------------------------------------------------

/// Read every file into a batch. Unreadable files are reported and counted.
async fn load_batch(files: &[PathBuf]) -> (Batch, usize) {
    let mut batch = Batch::new();
    let mut unreadable = 0;
    for path in files {
        let name = display_name(path);
        match tokio::fs::read(path).await {
            Ok(data) => {
                batch.add_file(name, data, None);
            }
            Err(e) => {
                warn!(path = %path.display(), "could not read input: {e}");
                println!("FAILED  {name}: {e}");
                unreadable += 1;
            }
        }
    }
    (batch, unreadable)
}

/// File names of the inputs that sit directly in `dir`, so outputs written
/// there never replace them.
async fn inputs_in_dir(dir: &Path, files: &[PathBuf]) -> HashSet<String> {
    let mut names = HashSet::new();
    let Ok(dir) = tokio::fs::canonicalize(dir).await else {
        return names;
    };
    for path in files {
        let Ok(resolved) = tokio::fs::canonicalize(path).await else {
            continue;
        };
        if resolved.parent() == Some(dir.as_path()) {
            if let Some(name) = resolved.file_name().and_then(|n| n.to_str()) {
                names.insert(name.to_string());
            }
        }
    }
    names
}

fn print_statuses(batch: &Batch) {
    for item in batch.items() {
        match item.status {
            FileStatus::Success => {
                let size = item.result.as_ref().map(ImageBytes::len).unwrap_or(0);
                let output = item.output_name.as_deref().unwrap_or(&item.name);
                println!("ok      {} -> {output} ({size} bytes)", item.name);
            }
            FileStatus::Error => {
                let reason = item.error.as_deref().unwrap_or("unknown error");
                println!("FAILED  {}: {reason}", item.name);
            }
            FileStatus::Idle | FileStatus::Converting => {}
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, buffer).unwrap();
        path
    }

    fn services(dir: &Path) -> AppServices {
        AppServices::with_config_path(&dir.join("config.json"))
    }

    #[tokio::test]
    async fn convert_writes_each_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "cat.png", 24, 16);
        let out = dir.path().join("out");
        let services = services(dir.path());

        let ok = convert(&services, &[input], Some(TargetFormat::WebP), Some(80), &out, false)
            .await
            .unwrap();
        assert!(ok);
        assert!(out.join("cat.webp").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn convert_reports_failures_but_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png", 8, 8);
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"nope").unwrap();
        let missing = dir.path().join("missing.png");
        let out = dir.path().join("out");
        let services = services(dir.path());

        let ok = convert(&services, &[good, bad, missing], None, None, &out, true)
            .await
            .unwrap();
        assert!(!ok);
        assert!(out.join("converted_images.zip").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn same_stem_inputs_get_distinct_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = write_png(&dir.path().join("a"), "photo.png", 8, 8);
        let second = write_png(&dir.path().join("b"), "photo.png", 6, 4);
        let out = dir.path().join("out");
        let services = services(dir.path());

        let ok = convert(&services, &[first, second], Some(TargetFormat::Jpg), None, &out, false)
            .await
            .unwrap();
        assert!(ok);
        let first_out = ImageBytes::new(std::fs::read(out.join("photo.jpg")).unwrap(), None);
        let second_out = ImageBytes::new(std::fs::read(out.join("photo (1).jpg")).unwrap(), None);
        assert_eq!(probe_dimensions(&first_out).unwrap().width, 8);
        assert_eq!(probe_dimensions(&second_out).unwrap().width, 6);
        services.shutdown().await;
    }

    #[tokio::test]
    async fn converting_in_place_keeps_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "photo.png", 10, 10);
        let original = std::fs::read(&input).unwrap();
        let services = services(dir.path());

        let ok = convert(&services, &[input.clone()], Some(TargetFormat::Png), None, dir.path(), false)
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(std::fs::read(&input).unwrap(), original);
        assert!(dir.path().join("photo (1).png").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn pdf_writes_to_explicit_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 30, 20);
        let b = write_png(dir.path(), "b.png", 20, 30);
        let target = dir.path().join("album.pdf");
        let services = services(dir.path());

        let ok = pdf(&services, &[a, b], PdfOptions::default(), Some(&target), dir.path())
            .await
            .unwrap();
        assert!(ok);
        assert!(std::fs::read(&target).unwrap().starts_with(b"%PDF"));
        assert!(!dir.path().join("images.pdf").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn pdf_falls_back_to_configured_name() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 30, 20);
        let out = dir.path().join("exports");
        let services = services(dir.path());

        let ok = pdf(&services, &[a.clone()], PdfOptions::default(), None, &out)
            .await
            .unwrap();
        assert!(ok);
        assert!(std::fs::read(out.join("images.pdf")).unwrap().starts_with(b"%PDF"));

        config_set(&services, "pdf_name", "album.pdf").unwrap();
        pdf(&services, &[a], PdfOptions::default(), None, &out)
            .await
            .unwrap();
        assert!(out.join("album.pdf").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn pdf_rejects_negative_margin() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 30, 20);
        let services = services(dir.path());
        let options = PdfOptions {
            margin_mm: -50.0,
            ..PdfOptions::default()
        };

        let err = pdf(&services, &[a], options, None, dir.path()).await.unwrap_err();
        assert!(matches!(err, bildwerk_core::error::BildwerkError::Pdf(_)));
        assert!(!dir.path().join("images.pdf").exists());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn rotate_writes_swapped_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "wide.png", 30, 10);
        let output = dir.path().join("tall.png");
        let services = services(dir.path());

        rotate(&services, &input, RotationAngle::Deg90, &output).await.unwrap();
        let written = ImageBytes::new(std::fs::read(&output).unwrap(), None);
        let dims = probe_dimensions(&written).unwrap();
        assert_eq!((dims.width, dims.height), (10, 30));
        services.shutdown().await;
    }

    #[tokio::test]
    async fn probe_flags_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "ok.png", 3, 3);
        let services = services(dir.path());

        assert!(probe(&services, &[good.clone()]).await.unwrap());
        assert!(!probe(&services, &[good, dir.path().join("gone.png")]).await.unwrap());
        services.shutdown().await;
    }

    #[tokio::test]
    async fn config_set_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(dir.path());
        assert!(config_set(&services, "pdf.margin_mm", "12").unwrap());
        assert_eq!(services.config().pdf.margin_mm, 12.0);
        assert!(config_set(&services, "colour", "blue").is_err());
        services.shutdown().await;
    }
}
