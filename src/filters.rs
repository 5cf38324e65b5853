use crate::error::{FacilityFinancialsError, Result};
use crate::layout::LayoutFilters;
use crate::period::is_canonical_period;
use crate::schema::FacilityPeriod;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn contains(&self, period: &str) -> bool {
        self.start.as_deref().map_or(true, |start| period >= start)
            && self.end.as_deref().map_or(true, |end| period <= end)
    }
}

/// Period selection for the dashboard. Comparisons are plain string
/// comparisons on canonical `YYYY-MM` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFilter {
    pub selected_periods: Vec<String>,
    pub compare_with: Option<String>,
    pub show_comparison: bool,
    pub date_range: DateRange,
}

impl PeriodFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available_periods(periods: &[FacilityPeriod]) -> Vec<String> {
        let mut keys: Vec<String> = periods.iter().map(|p| p.period.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn set_selected_periods(&mut self, selected: Vec<String>) {
        self.selected_periods = selected;
    }

    pub fn set_compare_with(&mut self, period: Option<String>) {
        self.compare_with = period;
    }

    pub fn set_show_comparison(&mut self, show: bool) {
        self.show_comparison = show;
    }

    /// Sets the range and selects every available period inside it. An open
    /// bound selects everything.
    pub fn set_date_range(
        &mut self,
        start: Option<&str>,
        end: Option<&str>,
        periods: &[FacilityPeriod],
    ) -> Result<()> {
        for bound in [start, end].into_iter().flatten() {
            if !is_canonical_period(bound) {
                return Err(FacilityFinancialsError::InvalidPeriod(bound.to_string()));
            }
        }

        self.date_range = DateRange {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        };

        let closed = start.is_some() && end.is_some();
        self.selected_periods = Self::available_periods(periods)
            .into_iter()
            .filter(|p| !closed || self.date_range.contains(p))
            .collect();
        Ok(())
    }

    pub fn filtered_periods<'a>(&self, periods: &'a [FacilityPeriod]) -> Vec<&'a FacilityPeriod> {
        periods
            .iter()
            .filter(|p| {
                self.selected_periods.is_empty() || self.selected_periods.contains(&p.period)
            })
            .filter(|p| self.date_range.contains(&p.period))
            .collect()
    }

    pub fn comparison_periods<'a>(&self, periods: &'a [FacilityPeriod]) -> Vec<&'a FacilityPeriod> {
        match (&self.compare_with, self.show_comparison) {
            (Some(target), true) => periods.iter().filter(|p| &p.period == target).collect(),
            _ => Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_layout_filters(&self) -> LayoutFilters {
        LayoutFilters {
            selected_periods: self.selected_periods.clone(),
            compare_with: self.compare_with.clone(),
            show_comparison: self.show_comparison,
        }
    }
}

impl From<&LayoutFilters> for PeriodFilter {
    fn from(filters: &LayoutFilters) -> Self {
        Self {
            selected_periods: filters.selected_periods.clone(),
            compare_with: filters.compare_with.clone(),
            show_comparison: filters.show_comparison,
            date_range: DateRange::default(),
        }
    }
}
