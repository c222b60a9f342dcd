//! Figures gateway library entry.
//!
//! Wires config, the dataset store, tenancy resolution, the authorization
//! policy and the learner-metrics API into an axum service. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod context;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod store;
