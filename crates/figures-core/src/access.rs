//! Tenancy and authorization capabilities consumed by the resolver and the
//! HTTP boundary.

use crate::error::Result;
use crate::model::{Site, User};

/// Maps a request host to the tenant it addresses.
pub trait SiteResolver: Send + Sync {
    fn resolve_site(&self, host: &str) -> Result<Site>;
}

/// Decides whether an authenticated caller may read a site's metrics.
pub trait AuthorizationChecker: Send + Sync {
    fn authorize(&self, caller: &User, site: &Site) -> Result<()>;
}
