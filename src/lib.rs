//! # Facility Financials
//!
//! A library for turning monthly P&L spreadsheets from senior-living facilities
//! into normalized period records and the operating metrics derived from them.
//!
//! ## Core Concepts
//!
//! - **Sheet Grid**: An already-decoded sheet, rows of primitive cells
//! - **Mapping**: Which header or row label feeds each canonical financial field.
//!   Auto-detection suggests one, the operator confirms it
//! - **Period Record**: One facility-month (`YYYY-MM`) of unsigned revenue and expense values
//! - **Derived Metrics**: OpEx, EBITDA, EBITDAR and NOI with their margins, aggregated
//!   by summing absolutes and recomputing margins
//! - **Dataset**: A named, timestamped collection of records merged by period
//!
//! ## Example
//!
//! ```rust,ignore
//! use facility_financials::*;
//!
//! let sheet = SheetGrid::from_strings(
//!     "P&L",
//!     vec![
//!         vec!["Account", "2024-01"],
//!         vec!["Total Revenue", "1,000,000"],
//!         vec!["Labor", "400,000"],
//!         vec!["Non-Labor Expense", "200,000"],
//!         vec!["Rent", "150,000"],
//!     ],
//! );
//!
//! let mut session = ImportSession::new(ImportSettings::default(), Workbook::new(vec![sheet]));
//! let mut mapping = session.detect()?.mapping;
//! mapping.set(MappingField::Period, "2024-01");
//!
//! let outcome = session.finish_partial(&mapping)?;
//! let summary = summarize_periods(outcome.periods());
//! assert_eq!(summary.totals.ebitda, 400_000.0);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod format;
pub mod grid;
pub mod ingestion;
pub mod layout;
pub mod mapping;
pub mod metrics;
pub mod period;
pub mod sample;
pub mod schema;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

pub use config::ImportSettings;
pub use dataset::Dataset;
pub use error::{FacilityFinancialsError, Result};
pub use filters::{DateRange, PeriodFilter};
pub use format::*;
pub use grid::{CellValue, SheetGrid, Workbook};
pub use ingestion::{ImportOutcome, ImportSession};
pub use layout::*;
pub use mapping::{
    apply_mapping, apply_mapping_with_report, auto_detect, auto_detect_with_limit, verify_mapping,
    Detection, MappingOutcome, SheetLayout, SkipReason,
};
pub use metrics::*;
pub use period::{find_period_token, format_period, format_period_range, normalize_period};
pub use sample::{generate_sample_periods, sample_dataset};
pub use schema::*;
pub use state::AppState;
pub use store::{DatasetStore, JsonFileStore, MemoryStore};
pub use utils::*;
pub use validation::{detect_gaps, validate, ValidationResult};

use log::debug;
use serde::{Deserialize, Serialize};

/// One period alongside the metrics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub period: String,
    pub values: PeriodValues,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub periods: Vec<PeriodMetrics>,
    pub totals: AggregatedMetrics,
}

/// Per-period metrics in ascending period order, plus the aggregate.
pub fn summarize_periods(periods: &[FacilityPeriod]) -> FinancialSummary {
    let mut rows: Vec<PeriodMetrics> = periods
        .iter()
        .map(|p| PeriodMetrics {
            period: p.period.clone(),
            values: p.values.clone(),
            metrics: calculate_metrics(p),
        })
        .collect();
    rows.sort_by(|a, b| a.period.cmp(&b.period));

    debug!("Summarized {} periods", rows.len());

    FinancialSummary {
        periods: rows,
        totals: aggregate_metrics(periods),
    }
}

/// Year-over-year growth of `periods` against the same months one year
/// earlier found in `history`.
pub fn year_over_year(
    periods: &[FacilityPeriod],
    history: &[FacilityPeriod],
) -> Result<GrowthSummary> {
    let mut prior_keys = Vec::with_capacity(periods.len());
    for period in periods {
        prior_keys.push(prior_year_period(&period.period)?);
    }

    let previous: Vec<FacilityPeriod> = history
        .iter()
        .filter(|p| prior_keys.contains(&p.period))
        .cloned()
        .collect();

    Ok(calculate_yoy_growth(periods, &previous))
}
