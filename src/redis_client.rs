use anyhow::{Context, Result};
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use std::collections::HashMap;

/// Redis client wrapper for the banlist record store.
/// Records live in hashes keyed by entity (pubkey/word/ip), temporary bans
/// as expiring string keys, and moderator credentials in a set.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    /// Create a new Redis client from a connection URL
    ///
    /// Supports both plain (redis://) and encrypted (rediss://) connections.
    /// A password in the URL is strongly recommended outside local development.
    pub async fn new(redis_url: &str) -> Result<Self> {
        if !redis_url.contains("://") {
            return Err(anyhow::anyhow!(
                "Invalid Redis URL format. Expected: redis://:password@host:port or rediss://:password@host:port"
            ));
        }

        if !redis_url.contains('@') {
            eprintln!("⚠️  WARNING: Redis URL does not include a password!");
            eprintln!("🔒 For production, always use: redis://:yourpassword@host:port");
        }

        let client = redis::Client::open(redis_url)
            .context("Failed to create Redis client from URL")?;

        let manager = ConnectionManager::new(client)
            .await
            .context("Failed to create Redis connection manager - check REDIS_URL and password")?;

        Ok(Self { manager })
    }

    /// Set a key-value pair with an expiration time (in seconds)
    pub async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), RedisError> {
        let mut conn = self.manager.clone();
        conn.set_ex(key, value, seconds).await
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.manager.clone();
        conn.get(key).await
    }

    /// Delete a key, returning how many keys were removed
    pub async fn del(&self, key: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.del(key).await
    }

    /// Set expiration on a key
    pub async fn expire(&self, key: &str, seconds: i64) -> Result<bool, RedisError> {
        let mut conn = self.manager.clone();
        conn.expire(key, seconds).await
    }

    /// Set a field in a hash
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), RedisError> {
        let mut conn = self.manager.clone();
        conn.hset(key, field, value).await
    }

    /// Get a field from a hash
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.manager.clone();
        conn.hget(key, field).await
    }

    /// Delete a field from a hash, returning how many fields were removed
    pub async fn hdel(&self, key: &str, field: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.hdel(key, field).await
    }

    /// Get all field-value pairs of a hash
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, RedisError> {
        let mut conn = self.manager.clone();
        conn.hgetall(key).await
    }

    /// Add a member to a set
    pub async fn sadd(&self, key: &str, member: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.sadd(key, member).await
    }

    /// Remove a member from a set
    pub async fn srem(&self, key: &str, member: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.srem(key, member).await
    }

    /// Check set membership
    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool, RedisError> {
        let mut conn = self.manager.clone();
        conn.sismember(key, member).await
    }

    /// Get the cardinality (number of members) of a set
    pub async fn scard(&self, key: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.scard(key).await
    }

    /// Get all keys matching a pattern
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, RedisError> {
        let mut conn = self.manager.clone();
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
    }

    /// Ping Redis to check if the connection is alive
    pub async fn ping(&self) -> Result<bool, RedisError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|resp| resp == "PONG")
    }
}
