//! Shared application state for the Figures service.
//!
//! Built once at startup (config + dataset), then cloned into every handler.
//! Startup errors are explicit (`Result` instead of panic).

use std::sync::Arc;

use figures_core::access::SiteResolver;
use figures_core::error::Result;
use figures_core::memory::MemoryStore;
use figures_core::repo::MetricsRepository;
use figures_core::LearnerMetricsResolver;

use crate::config::ServiceConfig;
use crate::context::DomainSiteResolver;
use crate::obs::ApiMetrics;
use crate::policy::SiteAdminPolicy;
use crate::store;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<ApiMetrics>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    repo: Arc<dyn MetricsRepository>,
    sites: Arc<dyn SiteResolver>,
    resolver: LearnerMetricsResolver,
}

impl AppState {
    /// Load the dataset named by `cfg` and wire the service.
    pub fn from_config(cfg: ServiceConfig) -> Result<Self> {
        let store = store::open_store(&cfg)?;
        Self::new(cfg, store)
    }

    /// Wire the service over an already-built store.
    pub fn new(cfg: ServiceConfig, store: MemoryStore) -> Result<Self> {
        let repo: Arc<dyn MetricsRepository> = Arc::new(store);
        let multisite = cfg.tenancy.multisite;

        let sites: Arc<dyn SiteResolver> = Arc::new(DomainSiteResolver::new(Arc::clone(&repo), &cfg.tenancy)?);
        let resolver = LearnerMetricsResolver::new(
            Arc::clone(&repo),
            Arc::new(SiteAdminPolicy::new(multisite)),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, repo, sites, resolver }),
            metrics: Arc::new(ApiMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn repo(&self) -> &dyn MetricsRepository {
        self.inner.repo.as_ref()
    }

    pub fn sites(&self) -> &dyn SiteResolver {
        self.inner.sites.as_ref()
    }

    pub fn resolver(&self) -> &LearnerMetricsResolver {
        &self.inner.resolver
    }

    pub fn metrics(&self) -> Arc<ApiMetrics> {
        Arc::clone(&self.metrics)
    }
}
