use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when RUST_LOG is unset
pub const DEFAULT_FILTER: &str = "info,ride=debug";

/// Resolve the log filter directive: RUST_LOG if set, otherwise the default
pub fn filter_directive(rust_log: Option<String>) -> String {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize logging.
/// - JSON lines on stdout
/// - RUST_LOG respected; default to "info,ride=debug"
pub fn init(service_name: &str) {
    let env_filter = filter_directive(std::env::var("RUST_LOG").ok());

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(service = %service_name, "Logging initialized");
}
