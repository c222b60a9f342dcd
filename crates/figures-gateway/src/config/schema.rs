use std::net::SocketAddr;

use serde::Deserialize;
use figures_core::error::{FiguresError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub tenancy: TenancySection,

    #[serde(default)]
    pub pagination: PaginationSection,

    pub dataset: DatasetSection,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FiguresError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.tenancy.validate()?;
        self.pagination.validate()?;

        if self.dataset.path.trim().is_empty() {
            return Err(FiguresError::BadRequest("dataset.path must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            FiguresError::BadRequest(format!("server.listen must be a valid SocketAddr: {}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenancySection {
    /// Scope users/courses/enrollments to the site's organisation.
    #[serde(default = "default_multisite")]
    pub multisite: bool,

    /// Site served to every host when `multisite` is off.
    #[serde(default)]
    pub default_domain: Option<String>,
}

impl Default for TenancySection {
    fn default() -> Self {
        Self {
            multisite: default_multisite(),
            default_domain: None,
        }
    }
}

impl TenancySection {
    pub fn validate(&self) -> Result<()> {
        if !self.multisite && self.default_domain.as_deref().map_or(true, |d| d.trim().is_empty()) {
            return Err(FiguresError::BadRequest(
                "tenancy.default_domain is required when multisite is false".into(),
            ));
        }
        Ok(())
    }
}

fn default_multisite() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationSection {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl PaginationSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.max_limit) {
            return Err(FiguresError::BadRequest(
                "pagination.max_limit must be between 1 and 10000".into(),
            ));
        }
        if !(1..=self.max_limit).contains(&self.default_limit) {
            return Err(FiguresError::BadRequest(
                "pagination.default_limit must be between 1 and max_limit".into(),
            ));
        }
        Ok(())
    }
}

fn default_limit() -> usize {
    20
}
fn default_max_limit() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSection {
    /// YAML dataset file; relative paths resolve against the working directory.
    pub path: String,
}
