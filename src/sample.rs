//! Synthetic monthly financials for demos and seeding an empty store.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::schema::{FacilityPeriod, PeriodValues, DEFAULT_FACILITY_NAME};
use crate::utils::shift_period;
use rand::Rng;

pub const SAMPLE_DATASET_ID: &str = "sample-dataset-1";
pub const SAMPLE_DATASET_NAME: &str = "Sample Financial Data";

/// Centered jitter in `[-spread/2, spread/2)`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * spread
}

pub fn generate_sample_periods<R: Rng + ?Sized>(
    facility_name: &str,
    start_period: &str,
    months: usize,
    rng: &mut R,
) -> Result<Vec<FacilityPeriod>> {
    let mut periods = Vec::with_capacity(months);

    for offset in 0..months {
        let period = shift_period(start_period, offset as u32)?;

        let revenue = 850_000.0 + jitter(rng, 100_000.0);
        let labor = revenue * (0.45 + jitter(rng, 0.05));
        let non_labor = revenue * (0.25 + jitter(rng, 0.03));
        let rent = revenue * (0.15 + jitter(rng, 0.02));

        let values = PeriodValues {
            revenue_total: revenue.round(),
            labor_expense: labor.round(),
            non_labor_expense: non_labor.round(),
            rent: rent.round(),
            other_income: Some((revenue * 0.02 * rng.gen::<f64>()).round()),
            depreciation: Some((revenue * 0.08 * (0.8 + rng.gen::<f64>() * 0.4)).round()),
            interest: Some((revenue * 0.03 * (0.8 + rng.gen::<f64>() * 0.4)).round()),
            census: Some((85.0 + jitter(rng, 10.0)).round()),
            adr: Some((280.0 + jitter(rng, 20.0)).round()),
        };

        periods.push(FacilityPeriod::new(facility_name, &period, values)?);
    }

    Ok(periods)
}

/// Six months of sample data starting January 2024.
pub fn sample_dataset() -> Result<Dataset> {
    let periods =
        generate_sample_periods(DEFAULT_FACILITY_NAME, "2024-01", 6, &mut rand::thread_rng())?;
    Ok(Dataset::new(SAMPLE_DATASET_NAME, DEFAULT_FACILITY_NAME, periods).with_id(SAMPLE_DATASET_ID))
}
