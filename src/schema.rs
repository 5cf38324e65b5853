use crate::error::{FacilityFinancialsError, Result};
use crate::period::is_canonical_period;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_FACILITY_NAME: &str = "Alpine Vista";
pub const DEFAULT_CURRENCY: &str = "USD";

fn default_facility_name() -> String {
    DEFAULT_FACILITY_NAME.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Canonical financial fields a sheet can be mapped onto.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum MappingField {
    Period,
    RevenueTotal,
    LaborExpense,
    NonLaborExpense,
    Rent,
    OtherIncome,
    Depreciation,
    Interest,
    Census,
    Adr,
}

impl MappingField {
    pub const ALL: [MappingField; 10] = [
        MappingField::Period,
        MappingField::RevenueTotal,
        MappingField::LaborExpense,
        MappingField::NonLaborExpense,
        MappingField::Rent,
        MappingField::OtherIncome,
        MappingField::Depreciation,
        MappingField::Interest,
        MappingField::Census,
        MappingField::Adr,
    ];

    /// Every field except `Period`, i.e. the ones that carry a numeric value.
    pub const VALUE_FIELDS: [MappingField; 9] = [
        MappingField::RevenueTotal,
        MappingField::LaborExpense,
        MappingField::NonLaborExpense,
        MappingField::Rent,
        MappingField::OtherIncome,
        MappingField::Depreciation,
        MappingField::Interest,
        MappingField::Census,
        MappingField::Adr,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MappingField::Period => "period",
            MappingField::RevenueTotal => "revenueTotal",
            MappingField::LaborExpense => "laborExpense",
            MappingField::NonLaborExpense => "nonLaborExpense",
            MappingField::Rent => "rent",
            MappingField::OtherIncome => "otherIncome",
            MappingField::Depreciation => "depreciation",
            MappingField::Interest => "interest",
            MappingField::Census => "census",
            MappingField::Adr => "adr",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            MappingField::Period
                | MappingField::RevenueTotal
                | MappingField::LaborExpense
                | MappingField::NonLaborExpense
                | MappingField::Rent
        )
    }
}

impl fmt::Display for MappingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodValues {
    #[schemars(description = "Total operating revenue for the month")]
    pub revenue_total: f64,

    #[schemars(description = "Salaries, wages and payroll")]
    pub labor_expense: f64,

    #[schemars(description = "Supplies, utilities, G&A and other non-labor operating expenses")]
    pub non_labor_expense: f64,

    #[schemars(description = "Rent or lease expense")]
    pub rent: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_income: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Average resident census")]
    pub census: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Average daily rate")]
    pub adr: Option<f64>,
}

impl PeriodValues {
    pub fn get(&self, field: MappingField) -> Option<f64> {
        match field {
            MappingField::Period => None,
            MappingField::RevenueTotal => Some(self.revenue_total),
            MappingField::LaborExpense => Some(self.labor_expense),
            MappingField::NonLaborExpense => Some(self.non_labor_expense),
            MappingField::Rent => Some(self.rent),
            MappingField::OtherIncome => self.other_income,
            MappingField::Depreciation => self.depreciation,
            MappingField::Interest => self.interest,
            MappingField::Census => self.census,
            MappingField::Adr => self.adr,
        }
    }

    pub fn set(&mut self, field: MappingField, value: f64) {
        match field {
            MappingField::Period => {}
            MappingField::RevenueTotal => self.revenue_total = value,
            MappingField::LaborExpense => self.labor_expense = value,
            MappingField::NonLaborExpense => self.non_labor_expense = value,
            MappingField::Rent => self.rent = value,
            MappingField::OtherIncome => self.other_income = Some(value),
            MappingField::Depreciation => self.depreciation = Some(value),
            MappingField::Interest => self.interest = Some(value),
            MappingField::Census => self.census = Some(value),
            MappingField::Adr => self.adr = Some(value),
        }
    }

    /// A row whose revenue and both expense lines are exactly zero carries no data.
    pub fn is_empty(&self) -> bool {
        self.revenue_total == 0.0 && self.labor_expense == 0.0 && self.non_labor_expense == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacilityPeriod {
    pub id: String,

    #[serde(default = "default_facility_name")]
    pub facility_name: String,

    #[schemars(description = "Calendar month in YYYY-MM format")]
    pub period: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub values: PeriodValues,
}

impl FacilityPeriod {
    pub fn new(facility_name: &str, period: &str, values: PeriodValues) -> Result<Self> {
        if !is_canonical_period(period) {
            return Err(FacilityFinancialsError::InvalidPeriod(period.to_string()));
        }

        Ok(Self {
            id: format!("{}-{}", facility_name, period),
            facility_name: facility_name.to_string(),
            period: period.to_string(),
            currency: default_currency(),
            values,
        })
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }
}

/// A confirmed mapping: every required field points at a header or row label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[schemars(description = "Header of the column holding the period, or a header that is itself a period")]
    pub period: String,
    pub revenue_total: String,
    pub labor_expense: String,
    pub non_labor_expense: String,
    pub rent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_income: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub census: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: MappingField) -> Option<&str> {
        match field {
            MappingField::Period => Some(&self.period),
            MappingField::RevenueTotal => Some(&self.revenue_total),
            MappingField::LaborExpense => Some(&self.labor_expense),
            MappingField::NonLaborExpense => Some(&self.non_labor_expense),
            MappingField::Rent => Some(&self.rent),
            MappingField::OtherIncome => self.other_income.as_deref(),
            MappingField::Depreciation => self.depreciation.as_deref(),
            MappingField::Interest => self.interest.as_deref(),
            MappingField::Census => self.census.as_deref(),
            MappingField::Adr => self.adr.as_deref(),
        }
    }

    /// Mapped value fields in canonical order, skipping empty targets.
    pub fn value_targets(&self) -> impl Iterator<Item = (MappingField, &str)> + '_ {
        MappingField::VALUE_FIELDS
            .into_iter()
            .filter_map(move |field| self.get(field).map(|target| (field, target)))
            .filter(|(_, target)| !target.trim().is_empty())
    }

    /// Every mapped field, period included, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MappingField, &str)> + '_ {
        MappingField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|target| (field, target)))
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ColumnMapping)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Candidate mapping produced by auto-detection and edited by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMapping {
    targets: BTreeMap<MappingField, String>,
}

impl PartialMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: MappingField) -> Option<&str> {
        self.targets.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: MappingField, target: impl Into<String>) {
        self.targets.insert(field, target.into());
    }

    pub fn clear(&mut self, field: MappingField) {
        self.targets.remove(&field);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MappingField, &str)> + '_ {
        self.targets.iter().map(|(field, target)| (*field, target.as_str()))
    }

    pub fn missing_required(&self) -> Vec<MappingField> {
        MappingField::ALL
            .into_iter()
            .filter(|field| field.is_required())
            .filter(|field| self.get(*field).map_or(true, |t| t.trim().is_empty()))
            .collect()
    }

    pub fn confirm(&self) -> Result<ColumnMapping> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(FacilityFinancialsError::IncompleteMapping {
                missing: missing.iter().map(|f| f.key().to_string()).collect(),
            });
        }

        let required = |field: MappingField| self.get(field).unwrap_or_default().to_string();
        let optional = |field: MappingField| {
            self.get(field)
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
        };

        Ok(ColumnMapping {
            period: required(MappingField::Period),
            revenue_total: required(MappingField::RevenueTotal),
            labor_expense: required(MappingField::LaborExpense),
            non_labor_expense: required(MappingField::NonLaborExpense),
            rent: required(MappingField::Rent),
            other_income: optional(MappingField::OtherIncome),
            depreciation: optional(MappingField::Depreciation),
            interest: optional(MappingField::Interest),
            census: optional(MappingField::Census),
            adr: optional(MappingField::Adr),
        })
    }
}

impl From<&ColumnMapping> for PartialMapping {
    fn from(mapping: &ColumnMapping) -> Self {
        let mut partial = PartialMapping::new();
        for field in MappingField::ALL {
            if let Some(target) = mapping.get(field) {
                partial.set(field, target);
            }
        }
        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_partial() -> PartialMapping {
        let mut partial = PartialMapping::new();
        partial.set(MappingField::Period, "Month");
        partial.set(MappingField::RevenueTotal, "Total Revenue");
        partial.set(MappingField::LaborExpense, "Salaries");
        partial.set(MappingField::NonLaborExpense, "Supplies");
        partial.set(MappingField::Rent, "Rent");
        partial
    }

    #[test]
    fn test_confirm_complete_mapping() {
        let mut partial = complete_partial();
        partial.set(MappingField::Interest, "Interest Expense");

        let mapping = partial.confirm().unwrap();
        assert_eq!(mapping.period, "Month");
        assert_eq!(mapping.interest.as_deref(), Some("Interest Expense"));
        assert_eq!(mapping.census, None);

        let mapped: Vec<MappingField> = mapping.iter().map(|(field, _)| field).collect();
        assert_eq!(mapped.len(), 6);
        assert_eq!(mapped[0], MappingField::Period);
        assert_eq!(PartialMapping::from(&mapping), partial);
    }

    #[test]
    fn test_confirm_reports_missing_required_fields() {
        let mut partial = complete_partial();
        partial.clear(MappingField::Rent);
        partial.set(MappingField::LaborExpense, "  ");

        match partial.confirm() {
            Err(FacilityFinancialsError::IncompleteMapping { missing }) => {
                assert_eq!(missing, vec!["laborExpense".to_string(), "rent".to_string()]);
            }
            other => panic!("expected IncompleteMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_facility_period_rejects_non_canonical_period() {
        assert!(FacilityPeriod::new("Alpine Vista", "2024-1", PeriodValues::default()).is_err());

        let period = FacilityPeriod::new("Alpine Vista", "2024-01", PeriodValues::default()).unwrap();
        assert_eq!(period.id, "Alpine Vista-2024-01");
        assert_eq!(period.currency, "USD");
    }

    #[test]
    fn test_period_serializes_camel_case() {
        let mut values = PeriodValues::default();
        values.set(MappingField::NonLaborExpense, 12.0);
        values.set(MappingField::Census, 88.0);
        let period = FacilityPeriod::new("Alpine Vista", "2024-02", values).unwrap();

        let json = serde_json::to_string(&period).unwrap();
        assert!(json.contains("\"facilityName\":\"Alpine Vista\""));
        assert!(json.contains("\"nonLaborExpense\":12.0"));
        assert!(json.contains("\"census\":88.0"));
        assert!(!json.contains("depreciation"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{"id":"x","period":"2024-03","values":{"revenueTotal":1.0,"laborExpense":0.0,"nonLaborExpense":0.0,"rent":0.0}}"#;
        let period: FacilityPeriod = serde_json::from_str(json).unwrap();
        assert_eq!(period.facility_name, DEFAULT_FACILITY_NAME);
        assert_eq!(period.currency, DEFAULT_CURRENCY);
    }
}
