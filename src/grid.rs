//! Decoded workbook model: sheets of primitive cells.
//!
//! The mapping engine only ever reads this model. Decoding from file bytes is
//! behind the `xlsx` feature (see [`Workbook::open`]); without it callers
//! assemble grids themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Lenient numeric read: tolerates currency symbols, thousands separators and
    /// accounting-style `(123)` negatives. Non-finite results count as unparseable.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            CellValue::Text(s) => parse_number(s),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}

/// One decoded sheet. The header row is the first row holding any non-empty cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a grid from string cells; handy for fixtures and CSV-like input.
    pub fn from_strings<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| CellValue::from(cell.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn header_row_index(&self) -> Option<usize> {
        header_row_index(&self.rows)
    }

    pub fn headers(&self) -> Vec<String> {
        self.header_row_index()
            .map(|idx| self.rows[idx].iter().map(CellValue::as_text).collect())
            .unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        data_rows(&self.rows)
    }
}

pub fn header_row_index(rows: &[Vec<CellValue>]) -> Option<usize> {
    rows.iter()
        .position(|row| row.iter().any(|cell| !cell.is_empty()))
}

pub fn data_rows(rows: &[Vec<CellValue>]) -> &[Vec<CellValue>] {
    match header_row_index(rows) {
        Some(idx) => &rows[idx + 1..],
        None => &[],
    }
}

/// First non-empty cell of a row, lower-cased and trimmed.
pub fn row_label(row: &[CellValue]) -> Option<String> {
    row.iter()
        .find(|cell| !cell.is_empty())
        .map(|cell| cell.as_text().trim().to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

impl Workbook {
    pub fn new(sheets: Vec<SheetGrid>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn headers(&self, name: &str) -> Option<Vec<String>> {
        self.sheet(name).map(SheetGrid::headers)
    }
}

#[cfg(feature = "xlsx")]
mod decode {
    use super::{CellValue, SheetGrid, Workbook};
    use crate::error::{FacilityFinancialsError, Result};
    use calamine::{open_workbook_auto, Data, Reader};
    use log::{debug, info};
    use std::path::Path;

    impl Workbook {
        /// Decodes an xlsx/xls/xlsb/ods file into cell grids.
        pub fn open(path: &Path) -> Result<Self> {
            let mut workbook = open_workbook_auto(path)
                .map_err(|e| FacilityFinancialsError::Decode(e.to_string()))?;

            let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
            if sheet_names.is_empty() {
                return Err(FacilityFinancialsError::Decode(
                    "workbook contains no sheets".to_string(),
                ));
            }

            let mut sheets = Vec::with_capacity(sheet_names.len());
            for sheet_name in &sheet_names {
                let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                    FacilityFinancialsError::Decode(format!(
                        "failed to read sheet '{}': {}",
                        sheet_name, e
                    ))
                })?;

                // Data may not start at A1; pad so column indices match the sheet.
                let (start_row, start_col) = range.start().unwrap_or((0, 0));
                let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
                for row in range.rows() {
                    let mut cells = vec![CellValue::Empty; start_col as usize];
                    cells.extend(row.iter().map(convert_cell));
                    rows.push(cells);
                }

                debug!("Decoded sheet '{}' with {} rows", sheet_name, rows.len());
                sheets.push(SheetGrid::new(sheet_name.clone(), rows));
            }

            info!("Decoded workbook {} ({} sheets)", path.display(), sheets.len());
            Ok(Workbook::new(sheets))
        }
    }

    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Float(n) => CellValue::Number(*n),
            Data::Int(n) => CellValue::Number(*n as f64),
            Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => CellValue::Text(value.date().format("%Y-%m-%d").to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_row_skips_blank_rows() {
        let grid = SheetGrid::from_strings(
            "P&L",
            vec![
                vec!["", "", ""],
                vec!["Account", "Budget", "Actual"],
                vec!["Total Revenue", "900", "1000"],
            ],
        );

        assert_eq!(grid.header_row_index(), Some(1));
        assert_eq!(grid.headers(), vec!["Account", "Budget", "Actual"]);
        assert_eq!(grid.data_rows().len(), 1);
    }

    #[test]
    fn test_empty_grid_has_no_headers() {
        let grid = SheetGrid::from_strings("Empty", vec![vec!["  ", ""]]);
        assert_eq!(grid.header_row_index(), None);
        assert!(grid.headers().is_empty());
        assert!(grid.data_rows().is_empty());
    }

    #[test]
    fn test_lenient_number_parsing() {
        assert_eq!(CellValue::text("1,234,567").as_number(), Some(1_234_567.0));
        assert_eq!(CellValue::text(" $2,500.50 ").as_number(), Some(2500.5));
        assert_eq!(CellValue::text("(1,000)").as_number(), Some(-1000.0));
        assert_eq!(CellValue::text("-42").as_number(), Some(-42.0));
        assert_eq!(CellValue::text("n/a").as_number(), None);
        assert_eq!(CellValue::text("inf").as_number(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_row_label_uses_first_non_empty_cell() {
        let row = vec![CellValue::Empty, CellValue::text("  Total Revenue "), 5.0.into()];
        assert_eq!(row_label(&row).as_deref(), Some("total revenue"));
        assert_eq!(row_label(&[CellValue::Empty]), None);
    }

    #[test]
    fn test_number_display_drops_trailing_zero() {
        assert_eq!(CellValue::Number(1000.0).as_text(), "1000");
        assert_eq!(CellValue::Number(12.5).as_text(), "12.5");
    }
}
