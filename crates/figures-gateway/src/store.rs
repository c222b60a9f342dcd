//! Dataset loading (YAML file -> validated in-memory store).

use std::fs;

use figures_core::error::{FiguresError, Result};
use figures_core::memory::MemoryStore;
use figures_core::model::Dataset;

use crate::config::ServiceConfig;

pub fn load_dataset_from_str(s: &str) -> Result<Dataset> {
    serde_yaml::from_str(s).map_err(|e| FiguresError::BadRequest(format!("invalid dataset yaml: {e}")))
}

pub fn load_dataset_from_file(path: &str) -> Result<Dataset> {
    let s = fs::read_to_string(path)
        .map_err(|e| FiguresError::Internal(format!("read dataset failed ({path}): {e}")))?;
    load_dataset_from_str(&s)
}

/// Load, validate and index the dataset named by `cfg`.
pub fn open_store(cfg: &ServiceConfig) -> Result<MemoryStore> {
    let dataset = load_dataset_from_file(&cfg.dataset.path)?;
    let store = MemoryStore::new(dataset, cfg.tenancy.multisite)?;
    tracing::info!(
        path = %cfg.dataset.path,
        sites = store.sites().len(),
        multisite = store.is_multisite(),
        "dataset loaded"
    );
    Ok(store)
}
