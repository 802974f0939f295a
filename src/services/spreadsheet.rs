// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spreadsheet reading: raw previews and header-anchored tables.
//!
//! Cell coordinates are absolute from A1, so leading empty rows and
//! columns count toward the `start_row`/`start_col` a client picks from
//! the preview. Sheets are held sparsely: a workbook with one cell far from
//! A1 only costs memory for the cells it actually has.

use crate::models::ExcelPreview;
use calamine::{open_workbook_auto, Data, Reader, Sheets, XlsxError};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

static EMPTY_CELL: Data = Data::Empty;

/// Reads uploaded workbooks (xlsx, xls, ods).
#[derive(Debug, Clone)]
pub struct ExcelProcessor {
    preview_rows: usize,
}

impl ExcelProcessor {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    /// Summarize every sheet: extent plus the first few rows as strings.
    pub fn preview<P: AsRef<Path>>(&self, path: P) -> Result<ExcelPreview, SpreadsheetError> {
        let mut workbook = open_workbook_auto(path.as_ref())?;
        let sheet_names = workbook.sheet_names();

        let mut preview_data = HashMap::new();
        let mut total_rows = HashMap::new();
        let mut total_cols = HashMap::new();

        for name in &sheet_names {
            let sheet = load_sheet(&mut workbook, name)?;

            let rows = (0..sheet.rows().min(self.preview_rows))
                .map(|r| sheet.row_strings(r))
                .collect();

            total_rows.insert(name.clone(), sheet.rows());
            total_cols.insert(name.clone(), sheet.cols());
            preview_data.insert(name.clone(), rows);
        }

        tracing::debug!(sheets = sheet_names.len(), "Built spreadsheet preview");

        Ok(ExcelPreview {
            sheet_names,
            preview_data,
            total_rows,
            total_cols,
        })
    }

    /// Extract the table whose header row starts at (`start_row`, `start_col`).
    ///
    /// Uses `sheet` when given, otherwise the first sheet of the workbook.
    pub fn extract_table<P: AsRef<Path>>(
        &self,
        path: P,
        start_row: usize,
        start_col: usize,
        sheet: Option<&str>,
    ) -> Result<SheetTable, SpreadsheetError> {
        let mut workbook = open_workbook_auto(path.as_ref())?;
        let names = workbook.sheet_names();

        let name = match sheet {
            Some(wanted) => names
                .iter()
                .find(|n| n.as_str() == wanted)
                .cloned()
                .ok_or_else(|| SpreadsheetError::SheetNotFound(wanted.to_string()))?,
            None => names.first().cloned().ok_or(SpreadsheetError::NoSheets)?,
        };

        let cells = load_sheet(&mut workbook, &name)?;
        let table = SheetTable::from_cells(&cells, start_row, start_col)?;

        tracing::debug!(
            sheet = %name,
            start_row,
            start_col,
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Extracted table"
        );
        Ok(table)
    }
}

/// Non-empty cells of one sheet keyed by absolute (row, column).
///
/// The extent runs from A1 to the last non-empty cell.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetCells {
    cells: BTreeMap<(u32, u32), Data>,
    rows: usize,
    cols: usize,
}

impl SheetCells {
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = ((u32, u32), Data)>,
    {
        let mut sheet = Self::default();
        for ((row, col), value) in cells {
            if matches!(value, Data::Empty) {
                continue;
            }
            sheet.rows = sheet.rows.max(row as usize + 1);
            sheet.cols = sheet.cols.max(col as usize + 1);
            sheet.cells.insert((row, col), value);
        }
        sheet
    }

    /// Rows from A1 through the last non-empty row.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Columns from A through the last non-empty column.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &Data {
        match (u32::try_from(row), u32::try_from(col)) {
            (Ok(r), Ok(c)) => self.cells.get(&(r, c)).unwrap_or(&EMPTY_CELL),
            _ => &EMPTY_CELL,
        }
    }

    /// Non-empty cells of one row, in column order.
    fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &Data)> {
        let row = u32::try_from(row).unwrap_or(u32::MAX);
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, col), value)| (col as usize, value))
    }

    /// One row rendered for display, padded to the sheet width.
    fn row_strings(&self, row: usize) -> Vec<String> {
        let mut out = vec![String::new(); self.cols];
        for (col, value) in self.row_cells(row) {
            out[col] = cell_to_string(value);
        }
        out
    }
}

/// Read one sheet without materializing its dense range where the format
/// allows it.
fn load_sheet(
    workbook: &mut Sheets<BufReader<File>>,
    name: &str,
) -> Result<SheetCells, SpreadsheetError> {
    match workbook {
        Sheets::Xlsx(xlsx) => {
            let mut reader = match xlsx.worksheet_cells_reader(name) {
                Ok(reader) => reader,
                // Chart sheets hold no cells.
                Err(XlsxError::NotAWorksheet(_)) => return Ok(SheetCells::default()),
                Err(e) => return Err(calamine::Error::from(e).into()),
            };
            let mut cells = Vec::new();
            while let Some(cell) = reader.next_cell().map_err(calamine::Error::from)? {
                cells.push((cell.get_position(), Data::from(cell.get_value().clone())));
            }
            Ok(SheetCells::from_cells(cells))
        }
        other => {
            let range = other.worksheet_range(name)?;
            let (row0, col0) = range.start().unwrap_or_default();
            Ok(SheetCells::from_cells(range.used_cells().map(|(r, c, value)| {
                ((row0 + r as u32, col0 + c as u32), value.clone())
            })))
        }
    }
}

/// A data table: one header row followed by data rows.
///
/// Rows are only as long as their last non-empty cell and blank rows are
/// dropped; look cells up through [`SheetTable::first_present`].
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl SheetTable {
    /// Slice a sheet at the given origin; the first row becomes the headers.
    pub fn from_cells(
        sheet: &SheetCells,
        start_row: usize,
        start_col: usize,
    ) -> Result<Self, SpreadsheetError> {
        if start_row >= sheet.rows() || start_col >= sheet.cols() {
            return Err(SpreadsheetError::OutOfRange {
                row: start_row,
                col: start_col,
                rows: sheet.rows(),
                cols: sheet.cols(),
            });
        }

        let headers = (start_col..sheet.cols())
            .enumerate()
            .map(|(i, col)| match sheet.get(start_row, col) {
                Data::Empty => format!("Column_{i}"),
                other => cell_to_string(other).trim().to_string(),
            })
            .collect();

        let rows = (start_row + 1..sheet.rows())
            .filter_map(|r| {
                let mut row = Vec::new();
                for (col, value) in sheet.row_cells(r).filter(|(col, _)| *col >= start_col) {
                    row.resize(col - start_col, Data::Empty);
                    row.push(value.clone());
                }
                (!row.is_empty()).then_some(row)
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Build a table from a dense grid anchored at A1.
    #[cfg(test)]
    pub(crate) fn from_grid(
        grid: Vec<Vec<Data>>,
        start_row: usize,
        start_col: usize,
    ) -> Result<Self, SpreadsheetError> {
        let cells = grid.into_iter().enumerate().flat_map(|(r, row)| {
            row.into_iter()
                .enumerate()
                .map(move |(c, value)| ((r as u32, c as u32), value))
        });
        Self::from_cells(&SheetCells::from_cells(cells), start_row, start_col)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Data>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of the first candidate column present in the table.
    ///
    /// A present column wins even when its cell is empty.
    pub fn first_present<'a>(&self, row: &'a [Data], candidates: &[&str]) -> Option<&'a Data> {
        candidates
            .iter()
            .find_map(|name| self.column_index(name))
            .map(|idx| row.get(idx).unwrap_or(&EMPTY_CELL))
    }
}

/// Render a cell for display. Empty cells become "".
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whole floats print without a fractional part so photo numbers like
/// `123` stay comparable with `123.jpg`.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Errors from spreadsheet operations.
#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Error reading Excel file: {0}")]
    Read(#[from] calamine::Error),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Start position (row {row}, column {col}) is outside the sheet ({rows} rows x {cols} columns)")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}
