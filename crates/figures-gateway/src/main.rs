//! Figures learner-metrics service.
//!
//! - Config: `figures.yaml` (or `$FIGURES_CONFIG`), strict parsing
//! - Dataset: YAML fixture loaded and validated at startup
//! - HTTP: `/api/learner-metrics/`, `/healthz`, `/metrics`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use figures_core::error::{FiguresError, Result};
use figures_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "figures-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::from_config(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "figures-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| FiguresError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| FiguresError::Internal(format!("server failed: {e}")))
}
