//! Point Counterpoint news service: binary entrypoint.
//! Boots the Axum HTTP server, the refresh job and the metrics endpoint.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use point_counterpoint::config::Settings;
use point_counterpoint::metrics::Metrics;
use point_counterpoint::refresh::{spawn_refresh_scheduler, RefreshCfg};
use point_counterpoint::{router, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("point_counterpoint=info,warn"));

    // The shuttle runtime may have installed its own subscriber already.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::load()?;
    tracing::info!(
        providers = ?settings.enabled_providers(),
        supabase = settings.supabase.is_some(),
        "settings loaded"
    );

    let state = AppState::from_settings(&settings)?;

    spawn_refresh_scheduler(
        RefreshCfg::from(&settings.tunables),
        state.aggregator.clone(),
        state.store.clone(),
    );

    let mut app = router(state);
    match Metrics::init() {
        Ok(metrics) => app = app.merge(metrics.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(app.into())
}
