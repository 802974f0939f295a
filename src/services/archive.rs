// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ZIP archive extraction for bulk image uploads.

use crate::services::sniff;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// Result of extracting an archive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractOutcome {
    /// Base names written to the destination, in archive order
    pub extracted: Vec<String>,
    /// Entry names that were not extracted
    pub skipped: Vec<String>,
}

/// Extract the image entries of a ZIP archive into `dest`.
///
/// Entries are flattened to their base name, so nothing is written outside
/// `dest`. Non-image entries, entries larger than `max_entry_bytes`, and
/// entries beyond the first `max_images` images are skipped.
pub fn extract_images(
    bytes: &[u8],
    dest: &Path,
    max_images: usize,
    max_entry_bytes: u64,
) -> Result<ExtractOutcome, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut outcome = ExtractOutcome::default();
    fs::create_dir_all(dest).map_err(ArchiveError::Io)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let raw_name = entry.name().to_string();
        let base_name = entry
            .enclosed_name()
            .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string));

        let Some(base_name) = base_name.filter(|n| sniff::is_supported_image_name(n)) else {
            outcome.skipped.push(raw_name);
            continue;
        };

        if outcome.extracted.len() >= max_images || entry.size() > max_entry_bytes {
            outcome.skipped.push(raw_name);
            continue;
        }

        let mut content = Vec::new();
        (&mut entry)
            .take(max_entry_bytes.saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::Invalid(zip::result::ZipError::Io(e)))?;

        if content.len() as u64 > max_entry_bytes || !sniff::is_image_content(&content) {
            outcome.skipped.push(raw_name);
            continue;
        }

        fs::write(dest.join(&base_name), &content).map_err(ArchiveError::Io)?;
        if !outcome.extracted.contains(&base_name) {
            outcome.extracted.push(base_name);
        }
    }

    tracing::debug!(
        extracted = outcome.extracted.len(),
        skipped = outcome.skipped.len(),
        "Extracted archive"
    );
    Ok(outcome)
}

/// Errors from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid ZIP file: {0}")]
    Invalid(#[from] zip::result::ZipError),

    #[error("Failed to write extracted file: {0}")]
    Io(std::io::Error),
}
