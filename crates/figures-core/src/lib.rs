//! Figures core: learner-metrics domain model, course keys, the read
//! repository seam, and the resolver that turns a site, a caller and course
//! filters into paginated learner records.
//!
//! This crate carries no HTTP or runtime dependencies so the resolver can be
//! exercised against in-memory data without a server.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `FiguresError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod access;
pub mod course_key;
pub mod error;
pub mod memory;
pub mod model;
pub mod pagination;
pub mod repo;
pub mod resolver;

/// Shared result type.
pub use error::{Result, FiguresError};
pub use course_key::CourseKey;
pub use resolver::LearnerMetricsResolver;
