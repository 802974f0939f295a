// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plant Database API
//!
//! Accepts a spreadsheet of plant observations plus the matching photos,
//! maps rows to photos, and serves the resulting plant database and images.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod time_utils;

use config::Config;
use services::{DataMapper, ExcelProcessor, ImageProcessor, SessionStore};
use storage::Storage;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub sessions: SessionStore,
    pub excel: ExcelProcessor,
    pub images: ImageProcessor,
    pub mapper: DataMapper,
}

impl AppState {
    /// Wire up services from configuration. Storage is rooted at `config.data_dir`.
    pub fn new(config: Config) -> Self {
        Self {
            storage: Storage::new(config.data_dir.clone()),
            sessions: SessionStore::new(),
            excel: ExcelProcessor::new(config.preview_rows),
            images: ImageProcessor::new(),
            mapper: DataMapper::new(),
            config,
        }
    }
}
