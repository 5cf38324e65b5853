//! Derived operating metrics. Every function here is total: ratios go through
//! [`safe_divide`], so a zero or non-finite denominator yields 0 rather than NaN.

use crate::schema::{FacilityPeriod, PeriodValues};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub opex: f64,
    pub ebitda: f64,
    pub ebitdar: f64,
    pub noi: f64,
    pub ebitda_margin: f64,
    pub ebitdar_margin: f64,
    pub noi_margin: f64,
}

impl DerivedMetrics {
    pub fn from_values(values: &PeriodValues) -> Self {
        let opex = values.labor_expense + values.non_labor_expense;
        let ebitda = values.revenue_total - opex;
        let ebitdar = ebitda + values.rent;
        let noi = ebitda - values.rent;

        Self {
            opex,
            ebitda,
            ebitdar,
            noi,
            ebitda_margin: margin(ebitda, values.revenue_total),
            ebitdar_margin: margin(ebitdar, values.revenue_total),
            noi_margin: margin(noi, values.revenue_total),
        }
    }
}

pub fn calculate_metrics(period: &FacilityPeriod) -> DerivedMetrics {
    DerivedMetrics::from_values(&period.values)
}

pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

fn margin(amount: f64, revenue: f64) -> f64 {
    safe_divide(amount, revenue) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub absolute: f64,
    pub percentage: f64,
}

pub fn calculate_period_change(current: f64, previous: f64) -> PeriodChange {
    let absolute = current - previous;
    PeriodChange {
        absolute,
        percentage: safe_divide(absolute, previous) * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Moves within one percentage point either way count as flat.
pub fn trend_direction(percentage: f64) -> TrendDirection {
    if percentage > 1.0 {
        TrendDirection::Up
    } else if percentage < -1.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub revenue_total: f64,
    pub opex: f64,
    pub ebitda: f64,
    pub ebitdar: f64,
    pub noi: f64,
    pub ebitda_margin: f64,
    pub ebitdar_margin: f64,
    pub noi_margin: f64,
}

/// Sums revenue and the absolute metrics, then recomputes margins from the
/// totals. Margins are never averaged across periods.
pub fn aggregate_metrics(periods: &[FacilityPeriod]) -> AggregatedMetrics {
    let mut totals = AggregatedMetrics::default();

    for period in periods {
        let metrics = calculate_metrics(period);
        totals.revenue_total += period.values.revenue_total;
        totals.opex += metrics.opex;
        totals.ebitda += metrics.ebitda;
        totals.ebitdar += metrics.ebitdar;
        totals.noi += metrics.noi;
    }

    totals.ebitda_margin = margin(totals.ebitda, totals.revenue_total);
    totals.ebitdar_margin = margin(totals.ebitdar, totals.revenue_total);
    totals.noi_margin = margin(totals.noi, totals.revenue_total);
    totals
}

/// Percentage growth of each headline metric between two period sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthSummary {
    pub revenue: f64,
    pub ebitda: f64,
    pub ebitdar: f64,
    pub noi: f64,
}

pub fn calculate_yoy_growth(
    current_periods: &[FacilityPeriod],
    previous_periods: &[FacilityPeriod],
) -> GrowthSummary {
    let current = aggregate_metrics(current_periods);
    let previous = aggregate_metrics(previous_periods);

    GrowthSummary {
        revenue: calculate_period_change(current.revenue_total, previous.revenue_total).percentage,
        ebitda: calculate_period_change(current.ebitda, previous.ebitda).percentage,
        ebitdar: calculate_period_change(current.ebitdar, previous.ebitdar).percentage,
        noi: calculate_period_change(current.noi, previous.noi).percentage,
    }
}
