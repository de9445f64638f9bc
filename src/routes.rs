use crate::{handlers, security::middleware::governor_middleware, state::AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public
        .route(
            "/blocked/pubkeys",
            get(handlers::get_blocked_pubkeys)
                .post(handlers::add_blocked_pubkey)
                .delete(handlers::remove_blocked_pubkey),
        )
        .route("/blocked/pubkeys/status", get(handlers::check_pubkey_status))
        .route(
            "/blocked/pubkeys/ban-reason",
            axum::routing::patch(handlers::update_ban_reason).delete(handlers::remove_ban_reason),
        )
        .route("/public/blocked/pubkeys", get(handlers::get_public_blocked_pubkeys))
        .route("/blocked/words", get(handlers::get_blocked_words))
        .route(
            "/blacklist/words",
            post(handlers::add_blacklisted_word).delete(handlers::remove_blacklisted_word),
        )
        .route(
            "/blocked/ips",
            get(handlers::get_blocked_ips)
                .post(handlers::add_blocked_ip)
                .delete(handlers::remove_blocked_ip),
        )
        .route(
            "/temp-ban/pubkeys",
            post(handlers::temp_ban_pubkey).delete(handlers::remove_temp_ban),
        )
        .route("/reports", post(handlers::report_pubkey))
        .route(
            "/moderators",
            post(handlers::add_moderator).delete(handlers::remove_moderator),
        )
        .route("/export/all", get(handlers::export_all))
        .route("/import/all", post(handlers::import_all))
        .route("/health", get(handlers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // The governor is outermost: every request is admitted or rejected
        // before any handler or store access.
        .layer(middleware::from_fn_with_state(state.clone(), governor_middleware))
        .with_state(state)
}
