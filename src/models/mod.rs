// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod plant;
pub mod preview;
pub mod session;

pub use plant::{Plant, PlantDatabase, PlantDatabaseMetadata};
pub use preview::{ExcelPreview, ImageInfo};
pub use session::{ProcessingStatus, SessionId};
