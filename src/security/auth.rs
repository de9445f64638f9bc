use crate::banlist::BanlistStore;
use crate::state::AppState;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

const API_KEY_HEADER: &str = "x-api-key";

/// Who a validated API key belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthRole {
    /// The shared admin secret from configuration
    Admin,
    /// A registered moderator key
    Moderator,
}

/// Validates x-api-key header values against the admin secret and the
/// moderator key table. Moderator keys are stored as SHA-256 digests.
#[derive(Clone)]
pub struct ApiKeyValidator {
    admin_key: String,
    store: BanlistStore,
}

impl ApiKeyValidator {
    pub fn new(admin_key: String, store: BanlistStore) -> Self {
        Self { admin_key, store }
    }

    /// Check a presented key, returning its role or None when unknown
    pub async fn validate(&self, presented: &str) -> anyhow::Result<Option<AuthRole>> {
        if presented == self.admin_key {
            return Ok(Some(AuthRole::Admin));
        }
        if self.store.is_moderator(&digest_key(presented)).await? {
            return Ok(Some(AuthRole::Moderator));
        }
        Ok(None)
    }
}

/// Hash an API key for storage and lookup
pub fn digest_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Per-endpoint authorization guard for moderator routes.
/// Mirrors the governor's rejection idiom: the caller short-circuits with the
/// returned error tuple.
pub async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthRole, (StatusCode, Json<Value>)> {
    let Some(presented) = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) else {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Missing API key"})),
        ));
    };

    match state.api_keys.validate(presented).await {
        Ok(Some(role)) => Ok(role),
        Ok(None) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Invalid API key"})),
        )),
        Err(e) => {
            eprintln!("API key validation error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Failed to validate API key"})),
            ))
        }
    }
}

/// Require the admin secret specifically (moderator keys are not enough)
pub async fn authorize_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<Value>)> {
    match authorize(state, headers).await? {
        AuthRole::Admin => Ok(()),
        AuthRole::Moderator => Err((
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Admin key required"})),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex_sha256() {
        let a = digest_key("moderator-key-1");
        let b = digest_key("moderator-key-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_keys_have_different_digests() {
        assert_ne!(digest_key("key-a"), digest_key("key-b"));
    }
}
