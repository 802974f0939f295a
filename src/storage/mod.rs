// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (local filesystem).

pub mod local;

pub use local::{sanitize_filename, Storage};

/// Scaffold directories, relative to the data directory.
pub mod dirs {
    pub const EXCEL_UPLOADS: &str = "uploads/excel";
    pub const IMAGE_UPLOADS: &str = "uploads/images";
    pub const PROCESSED_DATA: &str = "processed_data";
    pub const STATIC_ROOT: &str = "static";
    pub const STATIC_IMAGES: &str = "static/images";
    /// Per-request directories for image uploads still being received.
    pub const STAGING: &str = "uploads/.staging";

    /// Everything created at startup.
    pub const SCAFFOLD: [&str; 4] = [EXCEL_UPLOADS, IMAGE_UPLOADS, PROCESSED_DATA, STATIC_IMAGES];

    /// Suffix of the per-session database file in `processed_data/`.
    pub const DATABASE_SUFFIX: &str = "_plant_database.json";
}
