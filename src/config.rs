use anyhow::{bail, Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub const DEFAULT_RATE_LIMIT: u32 = 100;
pub const DEFAULT_WINDOW_SECS: u64 = 300;
pub const DEFAULT_BAN_SECS: u64 = 1260;

/// Request Governor tuning, fixed at startup
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// Maximum requests per client per window
    pub limit: u32,
    /// Length of the accounting window in seconds
    pub window_secs: u64,
    /// Length of a temporary ban once triggered, in seconds
    pub ban_secs: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RATE_LIMIT,
            window_secs: DEFAULT_WINDOW_SECS,
            ban_secs: DEFAULT_BAN_SECS,
        }
    }
}

impl GovernorConfig {
    /// Reject degenerate values before they produce degenerate behavior
    /// (limit=0 would ban every client on its first request).
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            bail!("RATE_LIMIT must be at least 1");
        }
        if self.window_secs == 0 {
            bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if self.ban_secs == 0 {
            bail!("RATE_LIMIT_BAN_SECS must be at least 1");
        }
        Ok(())
    }
}

/// Full process configuration, read from the environment exactly once
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub redis_url: String,
    pub admin_api_key: String,
    pub lists_dir: String,
    pub governor: GovernorConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let admin_api_key = env::var("ADMIN_API_KEY")
            .context("ADMIN_API_KEY must be set (shared moderator admin secret)")?;
        if admin_api_key.trim().is_empty() {
            bail!("ADMIN_API_KEY must not be empty");
        }

        let config = Self {
            port: parse_env("APP_PORT", 8010)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            admin_api_key,
            lists_dir: env::var("LISTS_DIR").unwrap_or_else(|_| "lists".to_string()),
            governor: GovernorConfig {
                limit: parse_env("RATE_LIMIT", DEFAULT_RATE_LIMIT)?,
                window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS)?,
                ban_secs: parse_env("RATE_LIMIT_BAN_SECS", DEFAULT_BAN_SECS)?,
            },
        };

        config.governor.validate()?;
        Ok(config)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GovernorConfig::default();
        assert_eq!(config.limit, 100);
        assert_eq!(config.window_secs, 300);
        assert_eq!(config.ban_secs, 1260);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let config = GovernorConfig {
            limit: 0,
            ..GovernorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = GovernorConfig {
            window_secs: 0,
            ..GovernorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ban_duration_is_rejected() {
        let config = GovernorConfig {
            ban_secs: 0,
            ..GovernorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
