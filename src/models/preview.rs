// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Spreadsheet preview and image metadata models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Raw view of every sheet, used by the client to pick the table origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExcelPreview {
    /// Sheet names in workbook order
    pub sheet_names: Vec<String>,
    /// First rows of each sheet, cells rendered as strings
    pub preview_data: HashMap<String, Vec<Vec<String>>>,
    pub total_rows: HashMap<String, usize>,
    pub total_cols: HashMap<String, usize>,
}

/// Metadata for one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImageInfo {
    pub filename: String,
    /// File size in MB (2 decimal places)
    pub size_mb: f64,
    /// (width, height) in pixels
    pub dimensions: (u32, u32),
    /// Decoder format name, e.g. "JPEG"
    pub format: String,
}
