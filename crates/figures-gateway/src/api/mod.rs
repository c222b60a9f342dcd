//! HTTP API: learner-metrics viewset, auth extraction, error mapping.

pub mod auth;
pub mod error;
pub mod learner_metrics;

pub use error::ApiError;
