//! Authorization policy.
//!
//! Decides which authenticated callers may read a site's learner metrics.

pub mod site_admin;

pub use site_admin::SiteAdminPolicy;
