//! Persistence for datasets and per-dataset layouts.
//!
//! Stores are plain load/save contracts with last-write-wins semantics.
//! Keys carry a format version so incompatible layouts can coexist on disk.

use crate::config::ImportSettings;
use crate::dataset::Dataset;
use crate::error::{FacilityFinancialsError, Result};
use crate::layout::LayoutConfig;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const STORAGE_VERSION: &str = "1.0.0";
const DATASETS_KEY: &str = "datasets";
const LAYOUTS_KEY: &str = "layouts";

pub trait DatasetStore {
    fn load_datasets(&self) -> Result<Vec<Dataset>>;
    fn save_datasets(&mut self, datasets: &[Dataset]) -> Result<()>;
    fn load_layout(&self, dataset_id: &str) -> Result<Option<LayoutConfig>>;
    fn save_layout(&mut self, dataset_id: &str, layout: &LayoutConfig) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

fn versioned_key(key: &str) -> String {
    format!("{}_v{}", key, STORAGE_VERSION)
}

fn layout_key(dataset_id: &str) -> String {
    versioned_key(&format!("{}_{}", LAYOUTS_KEY, escape_id(dataset_id)))
}

/// Percent-escapes everything outside `[A-Za-z0-9._-]` so an id always maps
/// to a single file name inside the store directory.
fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            FacilityFinancialsError::Storage(format!(
                "failed to create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        info!("Opened dataset store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Opens the store at the directory the settings point to.
    pub fn from_settings(settings: &ImportSettings) -> Result<Self> {
        Self::open(settings.resolved_storage_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FacilityFinancialsError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&data).map(Some).map_err(|e| {
            FacilityFinancialsError::Storage(format!("corrupt store file {}: {}", path.display(), e))
        })
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(|e| {
            FacilityFinancialsError::Storage(format!("failed to write {}: {}", path.display(), e))
        })?;
        info!("Saved {}", path.display());
        Ok(())
    }

    fn store_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            FacilityFinancialsError::Storage(format!("failed to list {}: {}", self.dir.display(), e))
        })?;

        let suffix = format!("_v{}.json", STORAGE_VERSION);
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let owned = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    n.ends_with(&suffix) && (n.starts_with(DATASETS_KEY) || n.starts_with(LAYOUTS_KEY))
                });
            if owned {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Bytes currently used by this store's files.
    pub fn usage(&self) -> Result<u64> {
        let mut total = 0;
        for path in self.store_files()? {
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }
}

impl DatasetStore for JsonFileStore {
    fn load_datasets(&self) -> Result<Vec<Dataset>> {
        Ok(self
            .read::<Vec<Dataset>>(&versioned_key(DATASETS_KEY))?
            .unwrap_or_default())
    }

    fn save_datasets(&mut self, datasets: &[Dataset]) -> Result<()> {
        self.write(&versioned_key(DATASETS_KEY), datasets)
    }

    fn load_layout(&self, dataset_id: &str) -> Result<Option<LayoutConfig>> {
        self.read(&layout_key(dataset_id))
    }

    fn save_layout(&mut self, dataset_id: &str, layout: &LayoutConfig) -> Result<()> {
        self.write(&layout_key(dataset_id), layout)
    }

    fn clear(&mut self) -> Result<()> {
        let files = self.store_files()?;
        for path in &files {
            fs::remove_file(path).map_err(|e| {
                FacilityFinancialsError::Storage(format!(
                    "failed to remove {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        info!("Cleared {} store files from {}", files.len(), self.dir.display());
        Ok(())
    }
}

/// In-process store holding serialized JSON, so it round-trips exactly like
/// the file store does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: String, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.entries.insert(key, json);
        Ok(())
    }
}

impl DatasetStore for MemoryStore {
    fn load_datasets(&self) -> Result<Vec<Dataset>> {
        Ok(self
            .read::<Vec<Dataset>>(&versioned_key(DATASETS_KEY))?
            .unwrap_or_default())
    }

    fn save_datasets(&mut self, datasets: &[Dataset]) -> Result<()> {
        self.write(versioned_key(DATASETS_KEY), datasets)
    }

    fn load_layout(&self, dataset_id: &str) -> Result<Option<LayoutConfig>> {
        self.read(&layout_key(dataset_id))
    }

    fn save_layout(&mut self, dataset_id: &str, layout: &LayoutConfig) -> Result<()> {
        self.write(layout_key(dataset_id), layout)
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
