use std::net::SocketAddr;

use anyhow::Context;
use ride_dash::DashboardSettings;
use ride_data::DataStore;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Observability
    ride_obs::init("ride-dash");

    // Config
    let cfg = match ride_config::AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to default configuration");
            ride_config::AppConfig::default()
        }
    };
    let http_bind = cfg.http_bind();
    let sources = cfg.data_sources();
    tracing::info!(?sources, policy = ?cfg.malformed_policy(), "data sources");

    // Build app and state
    let store = DataStore::new(sources, cfg.malformed_policy());
    let (app, state) = ride_dash::build_app(store, DashboardSettings::from_config(&cfg))?;

    // Load tables up front; stay up without them so pages can show the error
    match state.store.warm() {
        Ok(()) => ride_dash::set_ready(&state, true),
        Err(e) => tracing::error!(error = %e, "dataset failed to load"),
    }

    // Start HTTP server
    let addr: SocketAddr = http_bind
        .parse()
        .with_context(|| format!("invalid HTTP bind address {http_bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
