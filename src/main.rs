use court_gateway::{
    AppState, BackendState, HttpBackend,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Used when RUST_LOG is unset: request spans from tower-http, decisions and
/// proxy outcomes from this crate.
const DEFAULT_LOG_FILTER: &str = "court_gateway=debug,tower_http=info";

/// init_tracing
///
/// Pretty, human-oriented output locally. In production one JSON object per
/// event, flattened with the current request span so `req_id`, `surface`,
/// `role` and `proxy_route` land on every line.
fn init_tracing(env: &Env) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let pretty = (*env == Env::Local).then(|| tracing_subscriber::fmt::layer().pretty());
    let json = (*env == Env::Production).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .init();
}

/// main
///
/// Entry point: loads configuration, initializes logging, wires the backend
/// client into the shared state and serves the router.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    init_tracing(&config.env);

    tracing::info!(env = ?config.env, backend = %config.backend_url, "gateway starting");

    // 3. Backend Client
    let backend = Arc::new(HttpBackend::new(&config.backend_url)) as BackendState;

    // 4. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState { backend, config };

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!(addr = %bind_addr, docs = "/swagger-ui", "listening");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
