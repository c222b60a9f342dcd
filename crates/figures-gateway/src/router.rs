//! Axum router wiring.

use axum::{routing::get, Router};

use crate::{api::learner_metrics, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/learner-metrics/", get(learner_metrics::list))
        .route("/api/learner-metrics", get(learner_metrics::list))
        .route("/api/learner-metrics/:id/", get(learner_metrics::retrieve))
        .route("/api/learner-metrics/:id", get(learner_metrics::retrieve))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
