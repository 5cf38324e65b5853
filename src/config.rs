use crate::error::Result;
use crate::mapping::DEFAULT_DETECTION_ROW_LIMIT;
use crate::schema::{DEFAULT_CURRENCY, DEFAULT_FACILITY_NAME};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Import defaults, stored as a JSON file. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportSettings {
    pub facility_name: String,
    pub currency: String,
    /// How many data rows auto-detection scans for row labels.
    pub detection_row_limit: usize,
    pub storage_dir: Option<PathBuf>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            facility_name: DEFAULT_FACILITY_NAME.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            detection_row_limit: DEFAULT_DETECTION_ROW_LIMIT,
            storage_dir: None,
        }
    }
}

const DEFAULT_STORAGE_DIR: &str = "facility-financials";

impl ImportSettings {
    /// The configured store directory, or `facility-financials` under the
    /// system temp dir when none is set.
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_STORAGE_DIR))
    }

    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        info!("Loaded import settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = ImportSettings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.facility_name, "Alpine Vista");
        assert_eq!(settings.detection_row_limit, 50);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"facilityName": "Cedar Ridge"}"#).unwrap();

        let settings = ImportSettings::load(&path).unwrap();
        assert_eq!(settings.facility_name, "Cedar Ridge");
        assert_eq!(settings.currency, "USD");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = ImportSettings {
            detection_row_limit: 10,
            storage_dir: Some(dir.path().join("store")),
            ..Default::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(ImportSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_resolved_storage_dir() {
        let dir = TempDir::new().unwrap();
        let settings = ImportSettings {
            storage_dir: Some(dir.path().join("store")),
            ..Default::default()
        };
        assert_eq!(settings.resolved_storage_dir(), dir.path().join("store"));

        let fallback = ImportSettings::default().resolved_storage_dir();
        assert!(fallback.ends_with("facility-financials"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "facilityName = 'x'").unwrap();
        assert!(ImportSettings::load(&path).is_err());
    }
}
