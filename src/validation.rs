use crate::schema::FacilityPeriod;
use crate::utils::{months_between, period_start_date};
use log::warn;
use serde::{Deserialize, Serialize};

/// Errors block an import; warnings are advisory and never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }
}

pub fn validate(periods: &[FacilityPeriod]) -> ValidationResult {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if periods.is_empty() {
        errors.push("No valid data found in the sheet".to_string());
        return ValidationResult {
            is_valid: false,
            warnings,
            errors,
        };
    }

    // Rent above total revenue almost always means a mis-mapped row.
    for period in periods {
        if period.values.revenue_total < period.values.rent {
            warnings.push(format!(
                "Revenue ({}) is less than rent ({}) for {}",
                period.values.revenue_total, period.values.rent, period.period
            ));
        }
    }

    warnings.extend(detect_gaps(periods));

    for warning in &warnings {
        warn!("{}", warning);
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        warnings,
        errors,
    }
}

/// One warning per adjacent pair of sorted periods more than a month apart.
pub fn detect_gaps(periods: &[FacilityPeriod]) -> Vec<String> {
    let mut keys: Vec<&str> = periods.iter().map(|p| p.period.as_str()).collect();
    keys.sort_unstable();

    keys.windows(2)
        .filter_map(|pair| {
            let prev = period_start_date(pair[0])?;
            let curr = period_start_date(pair[1])?;
            if months_between(prev, curr) > 1 {
                Some(format!("Gap detected between {} and {}", pair[0], pair[1]))
            } else {
                None
            }
        })
        .collect()
}
