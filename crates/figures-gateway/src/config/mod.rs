//! Service config loader (strict parsing).

pub mod schema;

use std::fs;

use figures_core::error::{FiguresError, Result};

pub use schema::{DatasetSection, PaginationSection, ServerSection, ServiceConfig, TenancySection};

/// Env var that overrides the default config path.
pub const CONFIG_ENV: &str = "FIGURES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "figures.yaml";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FiguresError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| FiguresError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
