// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image metadata extraction for uploaded photos.

use crate::models::ImageInfo;
use crate::services::sniff;
use anyhow::Context;
use image::{ImageFormat, ImageReader};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Reads format, dimensions and size of the images in a session directory.
#[derive(Debug, Default, Clone)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Collect metadata for every readable image in `dir`, keyed by file name.
    ///
    /// Undecodable files are logged and skipped; a missing directory yields
    /// an empty map.
    pub fn scan<P: AsRef<Path>>(&self, dir: P) -> BTreeMap<String, ImageInfo> {
        let dir = dir.as_ref();
        let mut images = BTreeMap::new();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Image directory unreadable");
                return images;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !sniff::is_supported_image_name(filename) {
                continue;
            }

            match read_info(&path, filename) {
                Ok(info) => {
                    images.insert(filename.to_string(), info);
                }
                Err(e) => {
                    tracing::warn!(filename, error = %e, "Error processing image");
                }
            }
        }

        tracing::debug!(dir = %dir.display(), count = images.len(), "Scanned images");
        images
    }
}

fn read_info(path: &Path, filename: &str) -> anyhow::Result<ImageInfo> {
    let reader = ImageReader::open(path)
        .context("open image")?
        .with_guessed_format()
        .context("guess image format")?;
    let format = reader.format();
    let dimensions = reader.into_dimensions().context("read dimensions")?;
    let size = fs::metadata(path).context("stat image")?.len();

    let format = match format {
        Some(f) => format_name(f),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_uppercase(),
    };

    Ok(ImageInfo {
        filename: filename.to_string(),
        size_mb: round2(size as f64 / BYTES_PER_MB),
        dimensions,
        format,
    })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{other:?}").to_ascii_uppercase(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
