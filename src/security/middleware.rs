use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::models::GovernorRejection;
use crate::security::governor::{Decision, RejectReason};
use crate::state::AppState;

/// Middleware consulting the Request Governor exactly once per request,
/// before any handler logic or store access. The client's source address is
/// the rate-limiting identity.
pub async fn governor_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client_id = addr.ip().to_string();

    match state.governor.admit(&client_id) {
        Decision::Allowed => {
            state.metrics.record_admitted().await;
            next.run(req).await
        }
        Decision::Rejected {
            reason,
            retry_after_secs,
        } => {
            state.metrics.record_rejected(reason).await;
            rejection_response(reason, retry_after_secs)
        }
    }
}

/// Map a governor rejection onto HTTP: 429 for the request that overflowed
/// the window, 403 while a ban is in force. Both carry Retry-After.
fn rejection_response(reason: RejectReason, retry_after_secs: u64) -> Response {
    let status = match reason {
        RejectReason::RateLimitedAndBanned => StatusCode::TOO_MANY_REQUESTS,
        RejectReason::Banned => StatusCode::FORBIDDEN,
    };

    (
        status,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(json!(GovernorRejection::new(reason.as_str(), retry_after_secs))),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_overflow_maps_to_429() {
        let resp = rejection_response(RejectReason::RateLimitedAndBanned, 1260);
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry = resp.headers().get(header::RETRY_AFTER).unwrap();
        assert_eq!(retry.to_str().unwrap(), "1260");
    }

    #[test]
    fn active_ban_maps_to_403() {
        let resp = rejection_response(RejectReason::Banned, 42);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let retry = resp.headers().get(header::RETRY_AFTER).unwrap();
        assert_eq!(retry.to_str().unwrap(), "42");
    }
}
