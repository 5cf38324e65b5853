//! Spreadsheet-to-schema mapping: heuristic detection of candidate targets,
//! and application of a confirmed [`ColumnMapping`] to a decoded sheet.
//!
//! Two sheet layouts are understood:
//!
//! - **Columnar**: one row per month. The period header names a column of
//!   period cells and every other field names a column header.
//! - **Statement**: a P&L with one row per line item. The period header is
//!   itself a month (`"2024-01"`, `"Actual Jan 2024"`), its column holds that
//!   month's values and every other field names a row label.
//!
//! Detection rules are plain data tables evaluated in order; the first
//! header or row whose text matches any of a rule's patterns wins.

use crate::error::{FacilityFinancialsError, Result};
use crate::grid::{data_rows, header_row_index, row_label, CellValue};
use crate::period::{find_period_token, normalize_period};
use crate::schema::{ColumnMapping, FacilityPeriod, MappingField, PartialMapping, PeriodValues};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DETECTION_ROW_LIMIT: usize = 50;

pub const ACTUAL_COLUMN_PATTERNS: &[&str] = &[r"^actual$", r"actual"];

/// Fallback when no header mentions "actual".
pub const ACTUAL_COLUMN_KEYWORDS: &[&str] = &["amount", "value", "total"];

pub const PERIOD_COLUMN_PATTERNS: &[&str] = &[r"^period$", r"^month$", r"^date$", r"period", r"month"];

pub struct DetectionRule {
    pub field: MappingField,
    pub patterns: &'static [&'static str],
}

pub const ROW_LABEL_RULES: &[DetectionRule] = &[
    DetectionRule {
        field: MappingField::RevenueTotal,
        patterns: &[
            r"total\s*operating\s*revenue",
            r"total\s*revenue",
            r"operating\s*revenue",
            r"revenue",
        ],
    },
    DetectionRule {
        field: MappingField::LaborExpense,
        patterns: &[r"salar(y|ies)", r"wages", r"payroll", r"labor"],
    },
    DetectionRule {
        field: MappingField::NonLaborExpense,
        patterns: &[
            r"non[-\s]*labor",
            r"supplies",
            r"operating\s*expenses",
            r"other\s*opex",
            r"g&a",
            r"general\s*&\s*admin",
            r"utilities",
        ],
    },
    DetectionRule {
        field: MappingField::Rent,
        patterns: &[r"rent", r"lease\s*expense"],
    },
    DetectionRule {
        field: MappingField::Depreciation,
        patterns: &[r"depreciation"],
    },
    DetectionRule {
        field: MappingField::Interest,
        patterns: &[r"interest"],
    },
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).expect("detection patterns are valid regexes"))
        .collect()
}

static ACTUAL_COLUMN_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| compile(ACTUAL_COLUMN_PATTERNS));
static PERIOD_COLUMN_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| compile(PERIOD_COLUMN_PATTERNS));
static ROW_LABEL_REGEXES: Lazy<Vec<(MappingField, Vec<Regex>)>> = Lazy::new(|| {
    ROW_LABEL_RULES
        .iter()
        .map(|rule| (rule.field, compile(rule.patterns)))
        .collect()
});

fn matches_any(text: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// A candidate row label and the value read from the detected "actual" column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPreview {
    pub label: String,
    pub actual_value: f64,
}

/// Output of auto-detection. The mapping is a suggestion for the operator to
/// review, never applied as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub mapping: PartialMapping,
    pub actual_column: Option<usize>,
    pub row_labels: Vec<LabelPreview>,
}

impl Detection {
    pub fn preview_value(&self, label: &str) -> Option<f64> {
        let label = label.trim().to_lowercase();
        self.row_labels
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.actual_value)
    }
}

pub fn detect_actual_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| matches_any(h.trim(), &ACTUAL_COLUMN_REGEXES))
        .or_else(|| {
            headers.iter().position(|h| {
                let lower = h.to_lowercase();
                ACTUAL_COLUMN_KEYWORDS.iter().any(|k| lower.contains(k))
            })
        })
}

pub fn detect_period_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| matches_any(h.trim(), &PERIOD_COLUMN_REGEXES))
}

pub fn auto_detect(headers: &[String], rows: &[Vec<CellValue>]) -> Detection {
    auto_detect_with_limit(headers, rows, DEFAULT_DETECTION_ROW_LIMIT)
}

pub fn auto_detect_with_limit(
    headers: &[String],
    rows: &[Vec<CellValue>],
    row_limit: usize,
) -> Detection {
    let mut mapping = PartialMapping::new();

    let actual_column = detect_actual_column(headers);

    if let Some(idx) = detect_period_column(headers) {
        mapping.set(MappingField::Period, headers[idx].clone());
    }

    let row_labels: Vec<LabelPreview> = data_rows(rows)
        .iter()
        .take(row_limit)
        .filter_map(|row| {
            let label = row_label(row)?;
            let actual_value = actual_column
                .and_then(|idx| row.get(idx))
                .and_then(CellValue::as_number)
                .unwrap_or(0.0);
            Some(LabelPreview {
                label,
                actual_value,
            })
        })
        .collect();

    for (field, patterns) in ROW_LABEL_REGEXES.iter() {
        if let Some(preview) = row_labels.iter().find(|p| matches_any(&p.label, patterns)) {
            mapping.set(*field, preview.label.clone());
        }
    }

    info!(
        "Auto-detected {} of {} fields (actual column: {:?}, {} labels scanned)",
        mapping.len(),
        MappingField::ALL.len(),
        actual_column,
        row_labels.len()
    );

    Detection {
        mapping,
        actual_column,
        row_labels,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetLayout {
    Columnar,
    Statement { period: String },
}

impl SheetLayout {
    /// A period header that itself names a month marks a statement sheet.
    pub fn for_period_header(header: &str) -> Self {
        match find_period_token(header) {
            Some(period) => SheetLayout::Statement { period },
            None => SheetLayout::Columnar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    BlankPeriod,
    UnparseablePeriod(String),
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: SkipReason,
}

/// A non-empty cell that could not be read as a number and was zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellIssue {
    pub row_index: usize,
    pub field: MappingField,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub periods: Vec<FacilityPeriod>,
    pub skipped_rows: Vec<SkippedRow>,
    pub cell_issues: Vec<CellIssue>,
}

impl MappingOutcome {
    pub fn warnings(&self) -> Vec<String> {
        self.cell_issues
            .iter()
            .map(|issue| {
                format!(
                    "Could not read {} value '{}' in row {}; treated as 0",
                    issue.field,
                    issue.raw,
                    issue.row_index + 1
                )
            })
            .collect()
    }
}

/// Header lookup: exact text first, then case-insensitive and trimmed.
pub fn find_header(headers: &[String], target: &str) -> Option<usize> {
    headers.iter().position(|h| h == target).or_else(|| {
        let wanted = target.trim().to_lowercase();
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    })
}

/// Absolute row index of the first data row whose label equals `target`.
fn find_row(rows: &[Vec<CellValue>], first_data_row: usize, target: &str) -> Option<usize> {
    let wanted = target.trim().to_lowercase();
    rows.iter()
        .enumerate()
        .skip(first_data_row)
        .find(|(_, row)| row_label(row).as_deref() == Some(wanted.as_str()))
        .map(|(idx, _)| idx)
}

fn first_data_row(rows: &[Vec<CellValue>]) -> usize {
    header_row_index(rows).map_or(rows.len(), |idx| idx + 1)
}

fn locate_period_column(headers: &[String], mapping: &ColumnMapping) -> Result<usize> {
    find_header(headers, &mapping.period).ok_or_else(|| {
        FacilityFinancialsError::PeriodColumnNotFound {
            header: mapping.period.clone(),
        }
    })
}

/// Checks every mapped target resolves to a real column or row under the
/// layout implied by the period header.
pub fn verify_mapping(
    rows: &[Vec<CellValue>],
    headers: &[String],
    mapping: &ColumnMapping,
) -> Result<SheetLayout> {
    let period_index = locate_period_column(headers, mapping)?;
    let layout = SheetLayout::for_period_header(&headers[period_index]);
    let start = first_data_row(rows);

    for (field, target) in mapping.value_targets() {
        let resolved = match layout {
            SheetLayout::Columnar => find_header(headers, target).is_some(),
            SheetLayout::Statement { .. } => find_row(rows, start, target).is_some(),
        };
        if !resolved {
            return Err(FacilityFinancialsError::UnresolvedMapping {
                field: field.key().to_string(),
                target: target.to_string(),
            });
        }
    }

    Ok(layout)
}

pub fn apply_mapping(
    rows: &[Vec<CellValue>],
    headers: &[String],
    mapping: &ColumnMapping,
    facility_name: &str,
) -> Result<Vec<FacilityPeriod>> {
    apply_mapping_with_report(rows, headers, mapping, facility_name).map(|o| o.periods)
}

pub fn apply_mapping_with_report(
    rows: &[Vec<CellValue>],
    headers: &[String],
    mapping: &ColumnMapping,
    facility_name: &str,
) -> Result<MappingOutcome> {
    let period_index = locate_period_column(headers, mapping)?;
    let layout = SheetLayout::for_period_header(&headers[period_index]);

    let outcome = match &layout {
        SheetLayout::Columnar => {
            apply_columnar(rows, headers, mapping, facility_name, period_index)?
        }
        SheetLayout::Statement { period } => {
            apply_statement(rows, mapping, facility_name, period_index, period)?
        }
    };

    info!(
        "Applied mapping ({:?}): {} periods, {} rows skipped, {} unreadable cells",
        layout,
        outcome.periods.len(),
        outcome.skipped_rows.len(),
        outcome.cell_issues.len()
    );

    Ok(outcome)
}

/// Reads one mapped cell as an unsigned magnitude; anything unreadable is 0.
fn read_value(
    cell: Option<&CellValue>,
    field: MappingField,
    row_index: usize,
    issues: &mut Vec<CellIssue>,
) -> f64 {
    let cell = match cell {
        Some(cell) => cell,
        None => return 0.0,
    };

    match cell.as_number() {
        Some(value) => value.abs(),
        None => {
            if !cell.is_empty() {
                issues.push(CellIssue {
                    row_index,
                    field,
                    raw: cell.as_text(),
                });
            }
            0.0
        }
    }
}

fn apply_columnar(
    rows: &[Vec<CellValue>],
    headers: &[String],
    mapping: &ColumnMapping,
    facility_name: &str,
    period_index: usize,
) -> Result<MappingOutcome> {
    let mut columns = Vec::new();
    for (field, target) in mapping.value_targets() {
        match find_header(headers, target) {
            Some(idx) => columns.push((field, idx)),
            None => debug!("No column '{}' for {}; field left unset", target, field),
        }
    }

    let mut outcome = MappingOutcome::default();
    let start = first_data_row(rows);

    for (row_index, row) in rows.iter().enumerate().skip(start) {
        if row.is_empty() {
            continue;
        }

        let raw_period = row
            .get(period_index)
            .map(|c| c.as_text().trim().to_string())
            .unwrap_or_default();
        if raw_period.is_empty() {
            outcome.skipped_rows.push(SkippedRow {
                row_index,
                reason: SkipReason::BlankPeriod,
            });
            continue;
        }

        let period = match normalize_period(&raw_period) {
            Some(period) => period,
            None => {
                debug!("Row {}: unparseable period '{}'", row_index, raw_period);
                outcome.skipped_rows.push(SkippedRow {
                    row_index,
                    reason: SkipReason::UnparseablePeriod(raw_period),
                });
                continue;
            }
        };

        let mut values = PeriodValues::default();
        for &(field, col) in &columns {
            let value = read_value(row.get(col), field, row_index, &mut outcome.cell_issues);
            values.set(field, value);
        }

        if values.is_empty() {
            debug!("Row {}: no revenue or expense data for {}", row_index, period);
            outcome.skipped_rows.push(SkippedRow {
                row_index,
                reason: SkipReason::NoData,
            });
            continue;
        }

        outcome
            .periods
            .push(FacilityPeriod::new(facility_name, &period, values)?);
    }

    Ok(outcome)
}

fn apply_statement(
    rows: &[Vec<CellValue>],
    mapping: &ColumnMapping,
    facility_name: &str,
    period_index: usize,
    period: &str,
) -> Result<MappingOutcome> {
    let mut outcome = MappingOutcome::default();
    let start = first_data_row(rows);
    let mut values = PeriodValues::default();

    for (field, target) in mapping.value_targets() {
        match find_row(rows, start, target) {
            Some(row_index) => {
                let cell = rows[row_index].get(period_index);
                let value = read_value(cell, field, row_index, &mut outcome.cell_issues);
                values.set(field, value);
            }
            None => debug!("No row labelled '{}' for {}; field left unset", target, field),
        }
    }

    if values.is_empty() {
        debug!("Statement column for {} carries no data", period);
        outcome.skipped_rows.push(SkippedRow {
            row_index: start.saturating_sub(1),
            reason: SkipReason::NoData,
        });
    } else {
        outcome
            .periods
            .push(FacilityPeriod::new(facility_name, period, values)?);
    }

    Ok(outcome)
}
