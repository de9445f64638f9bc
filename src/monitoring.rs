use crate::redis_client::RedisClient;
use crate::security::governor::RejectReason;
use crate::security::RequestGovernor;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics tracker for monitoring admission decisions and service health
#[derive(Clone)]
pub struct MetricsTracker {
    requests_admitted: Arc<RwLock<u64>>,
    requests_rejected: Arc<RwLock<u64>>,
    reports_received: Arc<RwLock<u64>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            requests_admitted: Arc::new(RwLock::new(0)),
            requests_rejected: Arc::new(RwLock::new(0)),
            reports_received: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn record_admitted(&self) {
        let mut count = self.requests_admitted.write().await;
        *count += 1;
        metrics::counter!("requests_admitted_total", 1);
    }

    pub async fn record_rejected(&self, reason: RejectReason) {
        let mut count = self.requests_rejected.write().await;
        *count += 1;
        metrics::counter!("requests_rejected_total", 1);
        match reason {
            RejectReason::Banned => metrics::counter!("requests_rejected_banned_total", 1),
            RejectReason::RateLimitedAndBanned => {
                metrics::counter!("requests_rejected_overflow_total", 1)
            }
        }
    }

    pub async fn record_report(&self) {
        let mut count = self.reports_received.write().await;
        *count += 1;
        metrics::counter!("reports_received_total", 1);
    }

    pub async fn get_admitted(&self) -> u64 {
        *self.requests_admitted.read().await
    }

    pub async fn get_rejected(&self) -> u64 {
        *self.requests_rejected.read().await
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check status for the service
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub redis_connected: bool,
    pub requests_admitted: u64,
    pub requests_rejected: u64,
    pub tracked_windows: usize,
    pub active_bans: usize,
    pub timestamp: u64,
}

impl HealthStatus {
    pub async fn check(
        redis: &RedisClient,
        metrics: &MetricsTracker,
        governor: &RequestGovernor,
    ) -> Self {
        let redis_connected = redis.ping().await.unwrap_or(false);
        let (tracked_windows, active_bans) = governor.tracked_clients();

        Self {
            healthy: redis_connected,
            redis_connected,
            requests_admitted: metrics.get_admitted().await,
            requests_rejected: metrics.get_rejected().await,
            tracked_windows,
            active_bans,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        }
    }
}
