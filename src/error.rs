use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacilityFinancialsError {
    #[error("Period column '{header}' not found in sheet headers")]
    PeriodColumnNotFound { header: String },

    #[error("Mapping is missing required fields: {}", .missing.join(", "))]
    IncompleteMapping { missing: Vec<String> },

    #[error("Mapping for {field} points at '{target}', which is neither a column header nor a row label")]
    UnresolvedMapping { field: String, target: String },

    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Dataset already exists: {0}")]
    DuplicateDataset(String),

    #[error("Import failed validation: {}", .0.join("; "))]
    InvalidImport(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to decode workbook: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FacilityFinancialsError>;
