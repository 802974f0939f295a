// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plant database document produced by processing a session.
//!
//! Field names are camelCase on the wire; the frontend consumes this
//! document as-is.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single plant observation mapped to its photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Plant {
    /// Random identifier (UUID v4)
    pub id: String,
    /// Reference photo value from the spreadsheet
    pub ref_photo: String,
    /// Projected Y coordinate
    pub y_proj: f64,
    /// Projected X coordinate
    pub x_proj: f64,
    pub species_name: String,
    pub family: String,
    pub formation: String,
    /// Slope in degrees, when recorded
    pub slope: Option<f64>,
    pub exposure: String,
    pub altitude: f64,
    /// Image path relative to the image endpoint: `<session>/<file>`
    pub image_path: String,
    /// Image size in MB (2 decimal places)
    pub image_size: f64,
}

/// Summary of a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlantDatabaseMetadata {
    pub total_plants: usize,
    pub total_images: usize,
    pub successfully_mapped: usize,
    /// RFC3339 UTC timestamp
    pub processing_date: String,
    pub data_source: String,
    pub session_id: String,
}

/// The processed plant database for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlantDatabase {
    pub metadata: PlantDatabaseMetadata,
    /// Sorted, de-duplicated family names
    pub families: Vec<String>,
    pub plants: Vec<Plant>,
}
