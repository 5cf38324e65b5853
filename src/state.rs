//! Session state: the datasets, current selection, filters and layouts a
//! running dashboard works with, persisted through a [`DatasetStore`].
//!
//! Every mutation is applied in memory first and then saved. When the save
//! fails the error is returned and the in-memory change stays.

use crate::dataset::Dataset;
use crate::error::{FacilityFinancialsError, Result};
use crate::filters::PeriodFilter;
use crate::layout::{LayoutConfig, WidgetConfig, WidgetUpdate};
use crate::schema::FacilityPeriod;
use crate::store::DatasetStore;
use log::{info, warn};
use std::collections::BTreeMap;

pub struct AppState<S: DatasetStore> {
    store: S,
    datasets: Vec<Dataset>,
    current_dataset_id: Option<String>,
    pub filters: PeriodFilter,
    layouts: BTreeMap<String, LayoutConfig>,
}

impl<S: DatasetStore> AppState<S> {
    pub fn load(store: S) -> Result<Self> {
        let datasets = store.load_datasets()?;
        info!("Loaded {} datasets", datasets.len());

        Ok(Self {
            store,
            datasets,
            current_dataset_id: None,
            filters: PeriodFilter::default(),
            layouts: BTreeMap::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, dataset_id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == dataset_id)
    }

    fn dataset_mut(&mut self, dataset_id: &str) -> Result<&mut Dataset> {
        self.datasets
            .iter_mut()
            .find(|d| d.id == dataset_id)
            .ok_or_else(|| FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()))
    }

    fn persist_datasets(&mut self) -> Result<()> {
        self.store.save_datasets(&self.datasets).map_err(|e| {
            warn!("Failed to save datasets: {}", e);
            into_storage(e)
        })
    }

    /// Ids are unique; adding a dataset whose id is already present fails.
    pub fn add_dataset(&mut self, dataset: Dataset) -> Result<()> {
        if self.dataset(&dataset.id).is_some() {
            return Err(FacilityFinancialsError::DuplicateDataset(dataset.id));
        }
        info!(
            "Adding dataset '{}' ({} periods)",
            dataset.name,
            dataset.periods.len()
        );
        self.datasets.push(dataset);
        self.persist_datasets()
    }

    pub fn update_dataset_name(&mut self, dataset_id: &str, name: &str) -> Result<()> {
        self.dataset_mut(dataset_id)?.rename(name);
        self.persist_datasets()
    }

    /// Deleting the current dataset clears the selection.
    pub fn delete_dataset(&mut self, dataset_id: &str) -> Result<()> {
        let before = self.datasets.len();
        self.datasets.retain(|d| d.id != dataset_id);
        if self.datasets.len() == before {
            return Err(FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()));
        }

        if self.current_dataset_id.as_deref() == Some(dataset_id) {
            self.current_dataset_id = None;
        }
        self.layouts.remove(dataset_id);
        self.persist_datasets()
    }

    /// Merges periods into a dataset; returns how many were new.
    pub fn add_periods(&mut self, dataset_id: &str, periods: Vec<FacilityPeriod>) -> Result<usize> {
        let added = self.dataset_mut(dataset_id)?.add_periods(periods);
        self.persist_datasets()?;
        Ok(added)
    }

    pub fn set_current_dataset(&mut self, dataset_id: &str) -> Result<()> {
        if self.dataset(dataset_id).is_none() {
            return Err(FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()));
        }
        self.current_dataset_id = Some(dataset_id.to_string());
        Ok(())
    }

    pub fn current_dataset(&self) -> Option<&Dataset> {
        self.current_dataset_id
            .as_deref()
            .and_then(|id| self.dataset(id))
    }

    /// Loads the stored layout for a dataset, falling back to the default one.
    pub fn load_layout(&mut self, dataset_id: &str) -> Result<&LayoutConfig> {
        let layout = self
            .store
            .load_layout(dataset_id)?
            .unwrap_or_else(|| LayoutConfig::default_for(dataset_id));
        self.layouts.insert(dataset_id.to_string(), layout);
        self.layout_entry(dataset_id)
    }

    pub fn layout(&self, dataset_id: &str) -> Option<&LayoutConfig> {
        self.layouts.get(dataset_id)
    }

    fn layout_entry(&self, dataset_id: &str) -> Result<&LayoutConfig> {
        self.layouts
            .get(dataset_id)
            .ok_or_else(|| FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()))
    }

    pub fn save_layout(&mut self, dataset_id: &str, layout: LayoutConfig) -> Result<()> {
        self.layouts.insert(dataset_id.to_string(), layout);
        self.persist_layout(dataset_id)
    }

    fn persist_layout(&mut self, dataset_id: &str) -> Result<()> {
        let Some(layout) = self.layouts.get(dataset_id) else {
            return Err(FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()));
        };
        self.store.save_layout(dataset_id, layout).map_err(|e| {
            warn!("Failed to save layout for {}: {}", dataset_id, e);
            into_storage(e)
        })
    }

    /// Applies `edit` to a loaded layout and saves it. Layouts must be loaded
    /// (or saved) before they can be edited.
    fn edit_layout<T>(
        &mut self,
        dataset_id: &str,
        edit: impl FnOnce(&mut LayoutConfig) -> T,
    ) -> Result<T> {
        let layout = self
            .layouts
            .get_mut(dataset_id)
            .ok_or_else(|| FacilityFinancialsError::DatasetNotFound(dataset_id.to_string()))?;
        let result = edit(layout);
        self.persist_layout(dataset_id)?;
        Ok(result)
    }

    pub fn update_widget(
        &mut self,
        dataset_id: &str,
        widget_id: &str,
        update: WidgetUpdate,
    ) -> Result<bool> {
        self.edit_layout(dataset_id, |layout| layout.update_widget(widget_id, update))
    }

    pub fn add_widget(&mut self, dataset_id: &str, widget: WidgetConfig) -> Result<()> {
        self.edit_layout(dataset_id, |layout| layout.add_widget(widget))
    }

    pub fn remove_widget(&mut self, dataset_id: &str, widget_id: &str) -> Result<bool> {
        self.edit_layout(dataset_id, |layout| layout.remove_widget(widget_id))
    }

    pub fn reset_layout(&mut self, dataset_id: &str) -> Result<()> {
        self.save_layout(dataset_id, LayoutConfig::default_for(dataset_id))
    }
}

fn into_storage(err: FacilityFinancialsError) -> FacilityFinancialsError {
    match err {
        FacilityFinancialsError::Storage(_) => err,
        other => FacilityFinancialsError::Storage(other.to_string()),
    }
}
