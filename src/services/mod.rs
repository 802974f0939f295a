// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod archive;
pub mod cleanup;
pub mod images;
pub mod mapper;
pub mod sessions;
pub mod sniff;
pub mod spreadsheet;

pub use archive::{extract_images, ArchiveError, ExtractOutcome};
pub use images::ImageProcessor;
pub use mapper::{find_matching_image, normalize_filename, DataMapper, MappingError};
pub use sessions::SessionStore;
pub use sniff::SpreadsheetKind;
pub use spreadsheet::{ExcelProcessor, SheetTable, SpreadsheetError};
