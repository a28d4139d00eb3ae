//! Sheet/cell access for the analysis workbook.
//!
//! A workbook is either an Excel file read with `calamine`, or a directory
//! holding one header-less CSV file per sheet. Both end up as a grid of
//! [`Cell`]s anchored at `A1`, so fixed references like `tours!AE1` resolve
//! the same way for either source.

use crate::error::{Error, Result};
use crate::util::parse_f64_safe;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

pub const TOURS_SHEET: &str = "tours";
pub const VEHICLES_SHEET: &str = "vehicles";
pub const TCO_SHEET: &str = "TCO-calculation";

const REQUIRED_SHEETS: [&str; 3] = [TOURS_SHEET, VEHICLES_SHEET, TCO_SHEET];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Interpret a raw CSV field: blank is empty, numeric text is a number,
    /// anything else stays text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Cell::Empty;
        }
        match parse_f64_safe(raw) {
            Some(n) => Cell::Number(n),
            None => Cell::Text(raw.to_string()),
        }
    }

    fn parse_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::parse_text(s),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or_else(|| Cell::Number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            _ => Cell::Empty,
        }
    }
}

/// A named grid of cells; row 0 / column 0 is `A1`.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.into(), rows }
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    /// Cell at an A1-style reference such as `AE1`. Malformed references read as empty.
    pub fn at(&self, reference: &str) -> &Cell {
        match parse_reference(reference) {
            Some((row, col)) => self.cell(row, col),
            None => &EMPTY,
        }
    }

    /// Zero-based column index of a header in the first row, matched
    /// case-insensitively after trimming.
    pub fn column(&self, header: &str) -> Option<usize> {
        let first = self.rows.first()?;
        first.iter().position(|cell| match cell {
            Cell::Text(s) => s.trim().eq_ignore_ascii_case(header),
            _ => false,
        })
    }

    /// Rows below the header row, skipping rows with no values at all.
    pub fn data_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows
            .iter()
            .skip(1)
            .filter(|row| row.iter().any(|c| *c != Cell::Empty))
            .map(|row| row.as_slice())
    }
}

/// Converts `"AE1"` into zero-based `(row, col)` = `(0, 30)`.
pub fn parse_reference(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim();
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters
        .chars()
        .try_fold(0usize, |acc, c| {
            let v = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            acc.checked_mul(26)?.checked_add(v)
        })?
        - 1;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Open an `.xlsx`/`.xlsm` file or a directory of per-sheet CSV files.
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Self::from_csv_dir(path);
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" => Self::from_excel(path),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn from_excel(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let names = workbook.sheet_names();
        let mut sheets = Vec::with_capacity(REQUIRED_SHEETS.len());
        for name in REQUIRED_SHEETS {
            if !names.iter().any(|n| n == name) {
                return Err(Error::MissingSheet(name.to_string()));
            }
            let range = workbook.worksheet_range(name)?;
            let sheet = sheet_from_range(name, &range);
            debug!(sheet = name, rows = sheet.rows.len(), "read worksheet");
            sheets.push(sheet);
        }
        info!(path = %path.display(), "opened workbook");
        Ok(Self::from_sheets(sheets))
    }

    fn from_csv_dir(dir: &Path) -> Result<Self> {
        let mut sheets = Vec::with_capacity(REQUIRED_SHEETS.len());
        for name in REQUIRED_SHEETS {
            let file = dir.join(format!("{name}.csv"));
            if !file.is_file() {
                return Err(Error::MissingSheet(name.to_string()));
            }
            let mut rdr = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&file)?;
            let mut rows = Vec::new();
            for record in rdr.records() {
                let record = record?;
                rows.push(record.iter().map(Cell::parse).collect());
            }
            debug!(sheet = name, rows = rows.len(), "read csv sheet");
            sheets.push(Sheet::new(name, rows));
        }
        info!(path = %dir.display(), "opened csv workbook");
        Ok(Self::from_sheets(sheets))
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::MissingSheet(name.to_string()))
    }
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; first_col as usize];
        cells.extend(row.iter().map(Cell::from));
        rows.push(cells);
    }
    Sheet::new(name, rows)
}
