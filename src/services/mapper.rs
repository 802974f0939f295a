// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maps spreadsheet rows to uploaded photos and builds the plant database.
//!
//! Matching runs three passes over the image names (sorted, so results are
//! stable): exact normalized name, substring either way, then substring on
//! the "core" name with common photo prefixes/suffixes stripped.

use crate::models::{ImageInfo, Plant, PlantDatabase, PlantDatabaseMetadata, SessionId};
use crate::services::spreadsheet::{cell_to_string, SheetTable};
use crate::time_utils::format_utc_rfc3339;
use calamine::Data;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-.]").expect("valid regex"));
static PHOTO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(img|image|photo|pic)_?").expect("valid regex"));
static PHOTO_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_?(img|image|photo|pic)$").expect("valid regex"));

// Column fallbacks, first present column wins.
const Y_COLUMNS: &[&str] = &["Y_Proj", "yProj", "Y", "Latitude"];
const X_COLUMNS: &[&str] = &["X_Proj", "xProj", "X", "Longitude"];
const SPECIES_COLUMNS: &[&str] = &["Species Name", "speciesName", "Species", "Name"];
const FAMILY_COLUMNS: &[&str] = &["Family", "family"];
const FORMATION_COLUMNS: &[&str] = &["Formation", "formation", "Habitat"];
const SLOPE_COLUMNS: &[&str] = &["Slope", "slope"];
const EXPOSURE_COLUMNS: &[&str] = &["Exposure", "exposure", "Aspect"];
const ALTITUDE_COLUMNS: &[&str] = &["Altitude", "altitude", "Elevation"];

/// Normalize a file name or reference for comparison: stem only, no
/// punctuation beyond `-`, `_` and `.`, lowercase.
pub fn normalize_filename(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    NON_NAME_CHARS.replace_all(stem, "").to_lowercase()
}

fn core_name(normalized: &str) -> String {
    let stripped = PHOTO_PREFIX.replace(normalized, "");
    PHOTO_SUFFIX.replace(&stripped, "").into_owned()
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Find the image best matching a spreadsheet photo reference.
pub fn find_matching_image<'a>(
    reference: &str,
    images: &'a BTreeMap<String, ImageInfo>,
) -> Option<&'a str> {
    let wanted = normalize_filename(reference.trim());
    if wanted.is_empty() {
        return None;
    }

    // An image whose name normalizes to nothing would overlap every reference.
    let normalized: Vec<(&str, String)> = images
        .keys()
        .map(|name| (name.as_str(), normalize_filename(name)))
        .filter(|(_, norm)| !norm.is_empty())
        .collect();

    if let Some((name, _)) = normalized.iter().find(|(_, norm)| *norm == wanted) {
        return Some(*name);
    }

    if let Some((name, _)) = normalized.iter().find(|(_, norm)| overlaps(norm, &wanted)) {
        return Some(*name);
    }

    let wanted_core = core_name(&wanted);
    if wanted_core.is_empty() {
        return None;
    }
    normalized
        .iter()
        .find(|(_, norm)| {
            let core = core_name(norm);
            !core.is_empty() && overlaps(&core, &wanted_core)
        })
        .map(|(name, _)| *name)
}

/// Convert a cell to a number: numbers pass through, numeric text parses,
/// anything else is `None`. Non-finite values are `None` too; JSON cannot
/// hold them.
pub fn safe_float(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|f: &f64| f.is_finite())
}

/// Builds a [`PlantDatabase`] from a table and the scanned images.
#[derive(Debug, Default, Clone)]
pub struct DataMapper;

impl DataMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map(
        &self,
        table: &SheetTable,
        images: &BTreeMap<String, ImageInfo>,
        ref_photo_column: &str,
        session_id: &SessionId,
    ) -> Result<PlantDatabase, MappingError> {
        let ref_idx = table
            .column_index(ref_photo_column)
            .ok_or_else(|| MappingError::MissingColumn {
                column: ref_photo_column.to_string(),
                available: table.headers().to_vec(),
            })?;

        let mut plants = Vec::new();
        let mut families = BTreeSet::new();

        for (index, row) in table.rows().iter().enumerate() {
            let reference = row.get(ref_idx).map(cell_to_string).unwrap_or_default();

            let Some(image) = find_matching_image(&reference, images) else {
                tracing::debug!(row = index, reference = %reference, "No matching image found");
                continue;
            };

            match build_plant(table, row, &reference, image, &images[image], session_id) {
                Ok(plant) => {
                    families.insert(plant.family.clone());
                    plants.push(plant);
                }
                Err(e) => {
                    tracing::warn!(row = index, error = %e, "Error processing row");
                }
            }
        }

        tracing::info!(
            session_id = %session_id,
            rows = table.rows().len(),
            mapped = plants.len(),
            images = images.len(),
            "Mapped spreadsheet rows to images"
        );

        Ok(PlantDatabase {
            metadata: PlantDatabaseMetadata {
                total_plants: plants.len(),
                total_images: images.len(),
                successfully_mapped: plants.len(),
                processing_date: format_utc_rfc3339(chrono::Utc::now()),
                data_source: format!("Excel upload - Session {}", session_id),
                session_id: session_id.to_string(),
            },
            families: families.into_iter().collect(),
            plants,
        })
    }
}

fn build_plant(
    table: &SheetTable,
    row: &[Data],
    reference: &str,
    image: &str,
    info: &ImageInfo,
    session_id: &SessionId,
) -> Result<Plant, RowError> {
    let text = |columns: &[&str], default: &str| match table.first_present(row, columns) {
        None | Some(Data::Empty) => default.to_string(),
        Some(cell) => cell_to_string(cell),
    };

    // Absent column: default; present column that will not convert: row error.
    let required = |field: &'static str, columns: &[&str]| match table.first_present(row, columns) {
        None => Ok(0.0),
        Some(cell) => safe_float(cell).ok_or(RowError::NotNumeric(field)),
    };

    Ok(Plant {
        id: uuid::Uuid::new_v4().to_string(),
        ref_photo: reference.to_string(),
        y_proj: required("yProj", Y_COLUMNS)?,
        x_proj: required("xProj", X_COLUMNS)?,
        species_name: text(SPECIES_COLUMNS, "Unknown Species"),
        family: text(FAMILY_COLUMNS, "Unknown Family"),
        formation: text(FORMATION_COLUMNS, "Unknown Formation"),
        slope: table.first_present(row, SLOPE_COLUMNS).and_then(safe_float),
        exposure: text(EXPOSURE_COLUMNS, "Unknown"),
        altitude: required("altitude", ALTITUDE_COLUMNS)?,
        image_path: format!("{}/{}", session_id, image),
        image_size: info.size_mb,
    })
}

/// Errors that abort mapping.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Reference photo column '{column}' not found. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Errors that drop a single row.
#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("{0} is not a number")]
    NotNumeric(&'static str),
}
