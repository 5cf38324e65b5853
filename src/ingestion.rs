//! Import workflow: pick a sheet, review the suggested mapping, then turn the
//! sheet into validated period records.

use crate::config::ImportSettings;
use crate::dataset::Dataset;
use crate::error::{FacilityFinancialsError, Result};
use crate::grid::{SheetGrid, Workbook};
use crate::mapping::{
    apply_mapping_with_report, auto_detect_with_limit, verify_mapping, Detection, MappingOutcome,
};
use crate::schema::{ColumnMapping, FacilityPeriod, PartialMapping};
use crate::validation::{validate, ValidationResult};
use log::info;

pub struct ImportSession {
    settings: ImportSettings,
    workbook: Workbook,
    facility_name: String,
    selected_sheet: Option<String>,
}

impl ImportSession {
    /// Starts on the first sheet with the configured facility name.
    pub fn new(settings: ImportSettings, workbook: Workbook) -> Self {
        let selected_sheet = workbook.sheets.first().map(|s| s.name.clone());
        Self {
            facility_name: settings.facility_name.clone(),
            settings,
            workbook,
            selected_sheet,
        }
    }

    pub fn facility_name(&self) -> &str {
        &self.facility_name
    }

    pub fn set_facility_name(&mut self, name: &str) {
        self.facility_name = name.trim().to_string();
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheet_names()
    }

    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        if self.workbook.sheet(name).is_none() {
            return Err(FacilityFinancialsError::SheetNotFound(name.to_string()));
        }
        self.selected_sheet = Some(name.to_string());
        Ok(())
    }

    pub fn selected_sheet(&self) -> Result<&SheetGrid> {
        let name = self
            .selected_sheet
            .as_deref()
            .ok_or_else(|| FacilityFinancialsError::SheetNotFound("<none>".to_string()))?;
        self.workbook
            .sheet(name)
            .ok_or_else(|| FacilityFinancialsError::SheetNotFound(name.to_string()))
    }

    pub fn headers(&self) -> Result<Vec<String>> {
        Ok(self.selected_sheet()?.headers())
    }

    pub fn detect(&self) -> Result<Detection> {
        let sheet = self.selected_sheet()?;
        Ok(auto_detect_with_limit(
            &sheet.headers(),
            &sheet.rows,
            self.settings.detection_row_limit,
        ))
    }

    /// Confirms an operator-edited mapping and imports with it.
    pub fn finish_partial(&self, mapping: &PartialMapping) -> Result<ImportOutcome> {
        self.finish(&mapping.confirm()?)
    }

    pub fn finish(&self, mapping: &ColumnMapping) -> Result<ImportOutcome> {
        let sheet = self.selected_sheet()?;
        let headers = sheet.headers();

        verify_mapping(&sheet.rows, &headers, mapping)?;
        let mut report = apply_mapping_with_report(&sheet.rows, &headers, mapping, &self.facility_name)?;

        if self.settings.currency != crate::schema::DEFAULT_CURRENCY {
            for period in &mut report.periods {
                period.currency = self.settings.currency.clone();
            }
        }

        let mut validation = validate(&report.periods);
        validation.extend_warnings(report.warnings());

        info!(
            "Imported {} periods from sheet '{}' ({} warnings, {} errors)",
            report.periods.len(),
            sheet.name,
            validation.warnings.len(),
            validation.errors.len()
        );

        Ok(ImportOutcome {
            facility_name: self.facility_name.clone(),
            validation,
            report,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub facility_name: String,
    pub validation: ValidationResult,
    pub report: MappingOutcome,
}

impl ImportOutcome {
    pub fn periods(&self) -> &[FacilityPeriod] {
        &self.report.periods
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    /// Warnings never block; only validation errors do.
    pub fn into_dataset(self, name: &str) -> Result<Dataset> {
        if !self.validation.is_valid {
            return Err(FacilityFinancialsError::InvalidImport(self.validation.errors));
        }
        Ok(Dataset::new(name, &self.facility_name, self.report.periods))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MappingField;

    fn columnar_sheet() -> SheetGrid {
        SheetGrid::from_strings(
            "Monthly",
            vec![
                vec!["Period", "Revenue", "Labor", "Non-Labor", "Rent"],
                vec!["2024-01", "1000", "400", "200", "150"],
                vec!["2024-02", "1100", "n/a", "210", "150"],
            ],
        )
    }

    fn statement_sheet() -> SheetGrid {
        SheetGrid::from_strings(
            "P&L",
            vec![
                vec!["Account", "2024-01"],
                vec!["Total Revenue", "1000000"],
                vec!["Labor Expense", "400000"],
                vec!["Non-Labor Expense", "200000"],
                vec!["Rent Expense", "150000"],
            ],
        )
    }

    fn session() -> ImportSession {
        ImportSession::new(
            ImportSettings::default(),
            Workbook::new(vec![columnar_sheet(), statement_sheet()]),
        )
    }

    fn columnar_mapping() -> ColumnMapping {
        let mut partial = PartialMapping::new();
        partial.set(MappingField::Period, "Period");
        partial.set(MappingField::RevenueTotal, "Revenue");
        partial.set(MappingField::LaborExpense, "Labor");
        partial.set(MappingField::NonLaborExpense, "Non-Labor");
        partial.set(MappingField::Rent, "Rent");
        partial.confirm().unwrap()
    }

    #[test]
    fn test_defaults_to_first_sheet() {
        let session = session();
        assert_eq!(session.selected_sheet().unwrap().name, "Monthly");
        assert_eq!(session.facility_name(), "Alpine Vista");
        assert_eq!(session.sheet_names(), vec!["Monthly", "P&L"]);
    }

    #[test]
    fn test_unknown_sheet() {
        let mut session = session();
        let err = session.select_sheet("Balance Sheet").unwrap_err();
        assert!(matches!(err, FacilityFinancialsError::SheetNotFound(_)));
        assert_eq!(session.selected_sheet().unwrap().name, "Monthly");
    }

    #[test]
    fn test_finish_columnar_with_cell_warning() {
        let mut session = session();
        session.set_facility_name("Cedar Ridge ");
        let outcome = session.finish(&columnar_mapping()).unwrap();

        assert!(outcome.is_valid());
        assert_eq!(outcome.periods().len(), 2);
        assert_eq!(outcome.periods()[1].values.labor_expense, 0.0);
        assert_eq!(outcome.periods()[0].id, "Cedar Ridge-2024-01");
        assert_eq!(outcome.report.cell_issues.len(), 1);
        assert!(outcome.validation.warnings[0].contains("'n/a'"));

        let imported = outcome.periods().to_vec();
        let dataset = outcome.into_dataset("FY24").unwrap();
        assert_eq!(dataset.facility_name, "Cedar Ridge");
        assert_eq!(dataset.periods, imported);
    }

    #[test]
    fn test_detect_and_finish_statement() {
        let mut session = session();
        session.select_sheet("P&L").unwrap();

        let detection = session.detect().unwrap();
        assert!(detection.mapping.get(MappingField::Period).is_none());

        let mut mapping = detection.mapping.clone();
        mapping.set(MappingField::Period, "2024-01");
        let outcome = session.finish_partial(&mapping).unwrap();

        assert_eq!(outcome.periods().len(), 1);
        assert_eq!(outcome.periods()[0].period, "2024-01");
        assert_eq!(outcome.periods()[0].values.revenue_total, 1_000_000.0);
        assert_eq!(outcome.periods()[0].values.rent, 150_000.0);
    }

    #[test]
    fn test_incomplete_mapping_is_rejected() {
        let mut partial = PartialMapping::from(&columnar_mapping());
        partial.clear(MappingField::Rent);
        let err = session().finish_partial(&partial).unwrap_err();
        assert!(matches!(err, FacilityFinancialsError::IncompleteMapping { .. }));
    }

    #[test]
    fn test_empty_import_cannot_become_dataset() {
        let sheet = SheetGrid::from_strings(
            "Empty",
            vec![vec!["Period", "Revenue", "Labor", "Non-Labor", "Rent"]],
        );
        let session = ImportSession::new(ImportSettings::default(), Workbook::new(vec![sheet]));
        let outcome = session.finish(&columnar_mapping()).unwrap();

        assert!(!outcome.is_valid());
        let err = outcome.into_dataset("Empty").unwrap_err();
        assert!(matches!(err, FacilityFinancialsError::InvalidImport(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_currency_setting_applies() {
        let settings = ImportSettings {
            currency: "CAD".to_string(),
            ..Default::default()
        };
        let session = ImportSession::new(settings, Workbook::new(vec![columnar_sheet()]));
        let outcome = session.finish(&columnar_mapping()).unwrap();
        assert!(outcome.periods().iter().all(|p| p.currency == "CAD"));
    }
}
