use crate::banlist::BanlistStore;
use crate::redis_client::RedisClient;
use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::Serialize;

/// Reports older than this are forgiven
const REPORT_TTL_SECS: i64 = 604800; // 7 days
/// Unique reporters required before a pubkey is auto temp-banned
const REPORT_BAN_THRESHOLD: usize = 3;
/// Length of the automatic temp ban
const REPORT_BAN_SECS: u64 = 86400; // 24 hours

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub unique_reports: usize,
    pub temp_banned: bool,
}

/// User-report-to-ban workflow: counts unique reporters per pubkey over a
/// forgiveness horizon and escalates to a temporary ban at the threshold.
#[derive(Clone)]
pub struct ReportTracker {
    redis: RedisClient,
    store: BanlistStore,
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    id: String,
    pubkey: &'a str,
    reporter_id: &'a str,
    reported_at: chrono::DateTime<Utc>,
}

impl ReportTracker {
    pub fn new(redis: RedisClient, store: BanlistStore) -> Self {
        Self { redis, store }
    }

    /// Record a report against a pubkey. Duplicate reports from the same
    /// reporter do not increase the count.
    pub async fn add_report(&self, pubkey: &str, reporter_id: &str) -> Result<ReportOutcome> {
        let set_key = format!("reports:pubkey:{}", pubkey);

        self.redis
            .sadd(&set_key, reporter_id)
            .await
            .map_err(|e| anyhow!("Failed to add report: {}", e))?;
        self.redis
            .expire(&set_key, REPORT_TTL_SECS)
            .await
            .map_err(|e| anyhow!("Failed to set expiration on reports: {}", e))?;

        let unique_reports = self
            .redis
            .scard(&set_key)
            .await
            .map_err(|e| anyhow!("Failed to count reports: {}", e))? as usize;

        self.write_audit_record(pubkey, reporter_id).await;

        // Already banned keys stay banned without refreshing the expiry;
        // below the threshold nothing escalates.
        let mut temp_banned = self.store.get_temp_ban(pubkey).await?.is_some();
        if unique_reports >= REPORT_BAN_THRESHOLD && !temp_banned {
            self.store.apply_temp_ban(pubkey, REPORT_BAN_SECS).await?;
            let _ = self
                .store
                .update_ban_reason(
                    pubkey,
                    Some(format!("Auto-banned after {} unique reports", unique_reports)),
                )
                .await;
            temp_banned = true;
            println!(
                "🚨 Auto temp-ban applied to {} after {} unique reports",
                pubkey, unique_reports
            );
        }

        Ok(ReportOutcome {
            unique_reports,
            temp_banned,
        })
    }

    /// Best-effort audit trail entry; failures are logged, never surfaced
    async fn write_audit_record(&self, pubkey: &str, reporter_id: &str) {
        let record = ReportRecord {
            id: uuid::Uuid::new_v4().to_string(),
            pubkey,
            reporter_id,
            reported_at: Utc::now(),
        };
        let key = format!("report:{}", record.id);
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.redis.set_ex(&key, &json, REPORT_TTL_SECS as u64).await {
                    eprintln!("Failed to write report audit record: {}", e);
                }
            }
            Err(e) => eprintln!("Failed to serialize report audit record: {}", e),
        }
    }
}
