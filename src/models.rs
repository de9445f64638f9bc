use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A permanently blocked public key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockedPubkey {
    /// Canonical 64-character hex form
    pub pubkey: String,
    /// Original npub, when the key was submitted in bech32 form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    pub blocked_at: DateTime<Utc>,
}

/// A blacklisted word or phrase (exact match)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockedWord {
    pub word: String,
    pub blocked_at: DateTime<Utc>,
}

/// A blocked IP address
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockedIp {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    pub blocked_at: DateTime<Utc>,
}

/// A temporary suspension of a public key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TempBan {
    pub pubkey: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct BlockPubkeyRequest {
    /// npub or hex
    pub pubkey: String,
    pub ban_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PubkeyRequest {
    pub pubkey: String,
}

#[derive(Deserialize, Debug)]
pub struct TempBanRequest {
    pub pubkey: String,
    /// Ban length in hours
    #[serde(default = "default_temp_ban_hours")]
    pub duration: u32,
    pub ban_reason: Option<String>,
}

fn default_temp_ban_hours() -> u32 {
    24
}

#[derive(Deserialize, Debug)]
pub struct WordQuery {
    pub word: String,
}

#[derive(Deserialize, Debug)]
pub struct IpQuery {
    pub ip: String,
    pub ban_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct BanReasonQuery {
    pub pubkey: String,
    pub reason: String,
}

#[derive(Deserialize, Debug)]
pub struct PubkeyQuery {
    pub pubkey: String,
}

#[derive(Deserialize, Debug)]
pub struct ModeratorKeyRequest {
    pub api_key: String,
}

#[derive(Deserialize, Debug)]
pub struct ReportRequest {
    /// npub or hex of the reported account
    pub pubkey: String,
    /// Stable identifier of the reporter (only unique reporters count)
    pub reporter_id: String,
}

#[derive(Serialize, Debug)]
pub struct BlockPubkeyResponse {
    pub message: String,
    /// "blocked" or "already_blocked"
    pub status: String,
    pub pubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct PubkeyStatus {
    /// "blocked" or "not_blocked"
    pub status: String,
    pub temp_ban: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    pub unique_reports: usize,
    pub temp_banned: bool,
}

/// JSON body returned when the Request Governor rejects a request
#[derive(Debug, Serialize)]
pub struct GovernorRejection {
    pub error: &'static str,
    pub message: String,
    pub retry_after_seconds: u64,
}

impl GovernorRejection {
    pub fn new(reason: &'static str, retry_after_seconds: u64) -> Self {
        Self {
            error: reason,
            message: format!(
                "Too many requests - try again in {} seconds",
                retry_after_seconds
            ),
            retry_after_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_ban_duration_defaults_to_24_hours() {
        let request: TempBanRequest =
            serde_json::from_str(r#"{"pubkey": "abc"}"#).unwrap();
        assert_eq!(request.duration, 24);
        assert!(request.ban_reason.is_none());
    }

    #[test]
    fn blocked_pubkey_omits_empty_optionals() {
        let record = BlockedPubkey {
            pubkey: "ab".repeat(32),
            npub: None,
            ban_reason: None,
            blocked_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("npub"));
        assert!(!json.contains("ban_reason"));
    }
}
