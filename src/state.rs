use crate::banlist::BanlistStore;
use crate::config::AppConfig;
use crate::monitoring::MetricsTracker;
use crate::redis_client::RedisClient;
use crate::security::{ApiKeyValidator, ReportTracker, RequestGovernor};
use anyhow::Result;

#[derive(Clone)]
pub struct AppState {
    pub redis: RedisClient,
    pub store: BanlistStore,
    pub governor: RequestGovernor,
    pub api_keys: ApiKeyValidator,
    pub reports: ReportTracker,
    pub metrics: MetricsTracker,
    pub lists_dir: String,
}

impl AppState {
    /// Wire up all components from validated configuration
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let redis = RedisClient::new(&config.redis_url).await?;
        let store = BanlistStore::new(redis.clone());
        let governor = RequestGovernor::new(&config.governor);
        let api_keys = ApiKeyValidator::new(config.admin_api_key.clone(), store.clone());
        let reports = ReportTracker::new(redis.clone(), store.clone());
        let metrics = MetricsTracker::new();

        Ok(Self {
            redis,
            store,
            governor,
            api_keys,
            reports,
            metrics,
            lists_dir: config.lists_dir.clone(),
        })
    }
}
