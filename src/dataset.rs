use crate::schema::FacilityPeriod;
use chrono::{DateTime, Utc};
use log::info;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named collection of monthly records for one facility, unique by period
/// and kept in ascending period order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub facility_name: String,
    pub periods: Vec<FacilityPeriod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(name: &str, facility_name: &str, periods: Vec<FacilityPeriod>) -> Self {
        let now = Utc::now();
        let suffix: u16 = rand::thread_rng().gen();

        let mut dataset = Self {
            id: format!("dataset-{}-{:04x}", now.timestamp_millis(), suffix),
            name: name.to_string(),
            facility_name: facility_name.to_string(),
            periods: Vec::with_capacity(periods.len()),
            created_at: now,
            updated_at: now,
        };
        dataset.merge(periods);
        dataset
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Merges new records by period. Records whose period is already present
    /// are dropped, existing data is never overwritten. Returns how many were added.
    pub fn add_periods(&mut self, periods: Vec<FacilityPeriod>) -> usize {
        let added = self.merge(periods);
        self.updated_at = Utc::now();
        info!("Dataset {}: merged {} new periods", self.id, added);
        added
    }

    fn merge(&mut self, periods: Vec<FacilityPeriod>) -> usize {
        let mut seen: HashSet<String> = self.periods.iter().map(|p| p.period.clone()).collect();
        let before = self.periods.len();

        for period in periods {
            if seen.insert(period.period.clone()) {
                self.periods.push(period);
            }
        }

        // Zero-padded YYYY-MM sorts correctly as plain strings.
        self.periods.sort_by(|a, b| a.period.cmp(&b.period));
        self.periods.len() - before
    }

    pub fn period_keys(&self) -> Vec<String> {
        self.periods.iter().map(|p| p.period.clone()).collect()
    }

    pub fn period(&self, key: &str) -> Option<&FacilityPeriod> {
        self.periods.iter().find(|p| p.period == key)
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.updated_at = Utc::now();
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Dataset)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
