use std::sync::Arc;

use figures_core::access::SiteResolver;
use figures_core::error::{FiguresError, Result};
use figures_core::model::{Site, User};
use figures_core::repo::MetricsRepository;

use crate::config::TenancySection;

/// Resolved site and authenticated caller for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub site: Site,
    pub caller: User,
}

impl RequestContext {
    pub fn site_domain(&self) -> &str {
        &self.site.domain
    }
    pub fn caller_id(&self) -> u64 {
        self.caller.id
    }
}

/// Strip an optional `:port` suffix (bracketed IPv6 hosts included).
pub fn host_without_port(host: &str) -> &str {
    let host = host.trim();
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split_once(']').map_or(host, |(h, _)| h);
    }
    match host.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => h,
        _ => host,
    }
}

/// Host-header site resolution.
///
/// Multisite: the host must match a site domain. Single-site: every host
/// maps to the configured default site.
pub struct DomainSiteResolver {
    repo: Arc<dyn MetricsRepository>,
    default_site: Option<Site>,
}

impl DomainSiteResolver {
    pub fn new(repo: Arc<dyn MetricsRepository>, tenancy: &TenancySection) -> Result<Self> {
        let default_site = if tenancy.multisite {
            None
        } else {
            let domain = tenancy.default_domain.as_deref().unwrap_or_default();
            let site = repo.site_by_domain(domain)?.ok_or_else(|| {
                FiguresError::BadRequest(format!("tenancy.default_domain not in dataset: {domain}"))
            })?;
            Some(site)
        };
        Ok(Self { repo, default_site })
    }
}

impl SiteResolver for DomainSiteResolver {
    fn resolve_site(&self, host: &str) -> Result<Site> {
        if let Some(site) = &self.default_site {
            return Ok(site.clone());
        }
        let domain = host_without_port(host);
        self.repo
            .site_by_domain(domain)?
            .ok_or_else(|| FiguresError::NotFound(format!("unknown site: {domain}")))
    }
}
