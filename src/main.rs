mod banlist;
mod config;
mod exports;
mod handlers;
mod keys;
mod models;
mod monitoring;
mod redis_client;
mod routes;
mod security;
mod state;

use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;
use tower_http::cors::CorsLayer;

const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Invalid configuration (zero limits, missing admin key) is fatal here,
    // before anything starts serving.
    let config = config::AppConfig::from_env()?;

    if let Err(e) = PrometheusBuilder::new().install() {
        eprintln!("⚠️  Failed to install Prometheus exporter: {}", e);
    }

    println!("🔐 Initializing banlist service...");
    exports::ensure_lists_dir(&config.lists_dir).await?;
    let state = state::AppState::new(&config).await?;
    println!(
        "✅ Banlist service initialized (rate limit {}/{}s, ban {}s)",
        config.governor.limit, config.governor.window_secs, config.governor.ban_secs
    );

    // Periodic sweep keeps the governor's in-memory tables bounded: stale
    // windows and expired bans accumulate otherwise, one entry per client
    // ever seen.
    let governor = state.governor.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let evicted = governor.sweep();
            let (windows, bans) = governor.tracked_clients();
            metrics::gauge!("governor_tracked_windows", windows as f64);
            metrics::gauge!("governor_active_bans", bans as f64);
            if evicted > 0 {
                println!("🧹 Governor sweep evicted {} stale entries", evicted);
            }
        }
    });

    let app = routes::create_router(state).layer(CorsLayer::permissive());

    println!("🚀 Banlist API listening on http://0.0.0.0:{}", config.port);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
