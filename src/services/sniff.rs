// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Content-based file type checks.
//!
//! Extensions are checked first, then the leading bytes are sniffed so a
//! renamed file is not accepted for what its name claims.

use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];
const IMAGE_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/bmp", "image/tiff"];

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const ODS_MIME: &str = "application/vnd.oasis.opendocument.spreadsheet";
const XLS_MIME: &str = "application/vnd.ms-excel";
const ZIP_MIME: &str = "application/zip";
const OLE_MIME: &str = "application/x-ole-storage";

/// Spreadsheet container formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
    Ods,
}

impl SpreadsheetKind {
    pub fn from_filename(name: &str) -> Option<Self> {
        match extension(name)?.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }

    fn accepts_mime(self, mime: &str) -> bool {
        match self {
            // OOXML and ODF are zip containers; sniffers do not always see past the zip header.
            Self::Xlsx => mime == XLSX_MIME || mime == ZIP_MIME,
            Self::Ods => mime == ODS_MIME || mime == ZIP_MIME,
            Self::Xls => mime == XLS_MIME || mime == OLE_MIME,
        }
    }
}

/// Check that the bytes really hold the spreadsheet format the name claims.
pub fn verify_spreadsheet(kind: SpreadsheetKind, bytes: &[u8]) -> bool {
    sniffed_mime(bytes).is_some_and(|mime| kind.accepts_mime(mime))
}

pub fn is_supported_image_name(name: &str) -> bool {
    extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_image_content(bytes: &[u8]) -> bool {
    sniffed_mime(bytes).is_some_and(|mime| IMAGE_MIME_TYPES.contains(&mime))
}

/// MIME type to serve image bytes with.
pub fn image_mime(bytes: &[u8]) -> Option<&'static str> {
    sniffed_mime(bytes).filter(|mime| IMAGE_MIME_TYPES.contains(mime))
}

pub fn is_zip_name(name: &str) -> bool {
    extension(name).is_some_and(|ext| ext == "zip")
}

pub fn is_zip_content(bytes: &[u8]) -> bool {
    sniffed_mime(bytes) == Some(ZIP_MIME)
}

fn sniffed_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
