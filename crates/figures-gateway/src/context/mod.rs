//! Per-request tenant context.
//!
//! The site is derived from the request host; handlers never see raw host
//! strings past this layer.

pub mod site;

pub use site::{DomainSiteResolver, RequestContext};
