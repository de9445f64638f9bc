use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{
    exports, keys,
    monitoring::HealthStatus,
    models::{
        BanReasonQuery, BlockPubkeyRequest, BlockPubkeyResponse, BlockedIp, BlockedPubkey,
        BlockedWord, IpQuery, ModeratorKeyRequest, PubkeyQuery, PubkeyRequest, PubkeyStatus,
        ReportRequest, ReportResponse, TempBan, TempBanRequest, WordQuery,
    },
    security::auth::{authorize, authorize_admin, digest_key},
    state::AppState,
};

type HandlerError = (StatusCode, Json<Value>);

fn store_error(e: anyhow::Error) -> HandlerError {
    eprintln!("Store error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": "An unexpected error occurred."})),
    )
}

fn invalid_pubkey(e: anyhow::Error) -> HandlerError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": format!("Invalid public key: {}", e)})),
    )
}

// --- public endpoints ---

pub async fn get_blocked_pubkeys(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlockedPubkey>>, HandlerError> {
    state
        .store
        .list_blocked_pubkeys()
        .await
        .map(Json)
        .map_err(store_error)
}

/// Bare hex list for relay operators that just want the keys
pub async fn get_public_blocked_pubkeys(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, HandlerError> {
    let records = state
        .store
        .list_blocked_pubkeys()
        .await
        .map_err(store_error)?;
    Ok(Json(records.into_iter().map(|r| r.pubkey).collect()))
}

pub async fn get_blocked_words(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlockedWord>>, HandlerError> {
    state
        .store
        .list_blocked_words()
        .await
        .map(Json)
        .map_err(store_error)
}

pub async fn get_blocked_ips(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlockedIp>>, HandlerError> {
    state
        .store
        .list_blocked_ips()
        .await
        .map(Json)
        .map_err(store_error)
}

pub async fn check_pubkey_status(
    State(state): State<AppState>,
    Query(query): Query<PubkeyQuery>,
) -> Result<Json<PubkeyStatus>, HandlerError> {
    let pubkey = keys::normalize_pubkey(&query.pubkey).map_err(invalid_pubkey)?;

    let blocked = state
        .store
        .get_blocked_pubkey(&pubkey)
        .await
        .map_err(store_error)?;
    if blocked.is_none() {
        return Ok(Json(PubkeyStatus {
            status: "not_blocked".to_string(),
            temp_ban: false,
            expires_at: None,
        }));
    }

    let temp_ban = state
        .store
        .get_temp_ban(&pubkey)
        .await
        .map_err(store_error)?;
    Ok(Json(PubkeyStatus {
        status: "blocked".to_string(),
        temp_ban: temp_ban.is_some(),
        expires_at: temp_ban.map(|b| b.expires_at),
    }))
}

pub async fn report_pubkey(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, HandlerError> {
    let pubkey = keys::normalize_pubkey(&request.pubkey).map_err(invalid_pubkey)?;
    if request.reporter_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "reporter_id must not be empty"})),
        ));
    }

    state.metrics.record_report().await;
    let outcome = state
        .reports
        .add_report(&pubkey, request.reporter_id.trim())
        .await
        .map_err(store_error)?;

    Ok(Json(ReportResponse {
        success: true,
        message: if outcome.temp_banned {
            "Report recorded; account is temporarily banned".to_string()
        } else {
            "Report recorded".to_string()
        },
        unique_reports: outcome.unique_reports,
        temp_banned: outcome.temp_banned,
    }))
}

/// Health check endpoint for load balancers
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, StatusCode> {
    let health = HealthStatus::check(&state.redis, &state.metrics, &state.governor).await;

    if health.healthy {
        Ok(Json(serde_json::to_value(health).unwrap()))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// --- moderator endpoints (x-api-key) ---

pub async fn add_blocked_pubkey(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BlockPubkeyRequest>,
) -> Result<Json<BlockPubkeyResponse>, HandlerError> {
    authorize(&state, &headers).await?;

    let hex_pubkey = keys::normalize_pubkey(&request.pubkey).map_err(invalid_pubkey)?;
    let npub = request
        .pubkey
        .trim()
        .starts_with("npub1")
        .then(|| request.pubkey.trim().to_string());

    let (record, already_blocked) = state
        .store
        .add_blocked_pubkey(&hex_pubkey, npub, request.ban_reason)
        .await
        .map_err(store_error)?;

    let (message, status) = if already_blocked {
        ("Public key already blocked", "already_blocked")
    } else {
        ("Public key successfully blocked", "blocked")
    };
    Ok(Json(BlockPubkeyResponse {
        message: message.to_string(),
        status: status.to_string(),
        pubkey: record.pubkey,
        npub: record.npub,
        ban_reason: record.ban_reason,
    }))
}

pub async fn remove_blocked_pubkey(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PubkeyRequest>,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    let pubkey = keys::normalize_pubkey(&request.pubkey).map_err(invalid_pubkey)?;
    state
        .store
        .remove_blocked_pubkey(&pubkey)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({"message": "Public key removed"})))
}

pub async fn update_ban_reason(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BanReasonQuery>,
) -> Result<Json<BlockedPubkey>, HandlerError> {
    authorize(&state, &headers).await?;

    let pubkey = keys::normalize_pubkey(&query.pubkey).map_err(invalid_pubkey)?;
    match state
        .store
        .update_ban_reason(&pubkey, Some(query.reason))
        .await
        .map_err(store_error)?
    {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Public key not found"})),
        )),
    }
}

pub async fn remove_ban_reason(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PubkeyQuery>,
) -> Result<Json<BlockedPubkey>, HandlerError> {
    authorize(&state, &headers).await?;

    let pubkey = keys::normalize_pubkey(&query.pubkey).map_err(invalid_pubkey)?;
    match state
        .store
        .update_ban_reason(&pubkey, None)
        .await
        .map_err(store_error)?
    {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Public key not found"})),
        )),
    }
}

pub async fn add_blacklisted_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WordQuery>,
) -> Result<Json<BlockedWord>, HandlerError> {
    authorize(&state, &headers).await?;

    match state
        .store
        .add_blocked_word(query.word.trim())
        .await
        .map_err(store_error)?
    {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Word already blacklisted"})),
        )),
    }
}

pub async fn remove_blacklisted_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WordQuery>,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    if state
        .store
        .remove_blocked_word(query.word.trim())
        .await
        .map_err(store_error)?
    {
        Ok(Json(json!({"message": "Word removed from blacklist"})))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Word not found"})),
        ))
    }
}

pub async fn add_blocked_ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IpQuery>,
) -> Result<Json<BlockedIp>, HandlerError> {
    authorize(&state, &headers).await?;

    match state
        .store
        .add_blocked_ip(query.ip.trim(), query.ban_reason)
        .await
        .map_err(store_error)?
    {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "IP address already blocked"})),
        )),
    }
}

pub async fn remove_blocked_ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IpQuery>,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    if state
        .store
        .remove_blocked_ip(query.ip.trim())
        .await
        .map_err(store_error)?
    {
        Ok(Json(json!({"message": "IP address removed from blacklist"})))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "IP address not found"})),
        ))
    }
}

pub async fn temp_ban_pubkey(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TempBanRequest>,
) -> Result<Json<TempBan>, HandlerError> {
    authorize(&state, &headers).await?;

    if request.duration == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "duration must be at least 1 hour"})),
        ));
    }

    let pubkey = keys::normalize_pubkey(&request.pubkey).map_err(invalid_pubkey)?;
    let record = state
        .store
        .apply_temp_ban(&pubkey, u64::from(request.duration) * 3600)
        .await
        .map_err(store_error)?;

    // Backfill the blocked record's reason when one was supplied; a temp ban
    // on a key that is not on the permanent list is still valid.
    if let Some(reason) = request.ban_reason {
        let _ = state.store.update_ban_reason(&pubkey, Some(reason)).await;
    }

    Ok(Json(record))
}

pub async fn remove_temp_ban(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PubkeyRequest>,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    let pubkey = keys::normalize_pubkey(&request.pubkey).map_err(invalid_pubkey)?;
    state
        .store
        .remove_temp_ban(&pubkey)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({"message": "Temporary ban removed"})))
}

pub async fn export_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    let summary = exports::export_all(&state.lists_dir, &state.store)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({"message": "Data exported", "summary": summary})))
}

pub async fn import_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).await?;

    let summary = exports::import_all(&state.lists_dir, &state.store)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({"message": "Data imported", "summary": summary})))
}

// --- admin-only endpoints ---

pub async fn add_moderator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ModeratorKeyRequest>,
) -> Result<Json<Value>, HandlerError> {
    authorize_admin(&state, &headers).await?;

    if request.api_key.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "api_key must not be empty"})),
        ));
    }

    let added = state
        .store
        .add_moderator(&digest_key(request.api_key.trim()))
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "message": if added { "Moderator key added" } else { "Moderator key already registered" }
    })))
}

pub async fn remove_moderator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ModeratorKeyRequest>,
) -> Result<Json<Value>, HandlerError> {
    authorize_admin(&state, &headers).await?;

    if state
        .store
        .remove_moderator(&digest_key(request.api_key.trim()))
        .await
        .map_err(store_error)?
    {
        Ok(Json(json!({"message": "Moderator key removed"})))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Moderator key not found"})),
        ))
    }
}
