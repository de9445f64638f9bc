use crate::models::{BlockedIp, BlockedPubkey, BlockedWord, TempBan};
use crate::redis_client::RedisClient;
use anyhow::{anyhow, Result};
use chrono::Utc;

const BLOCKED_PUBKEYS_KEY: &str = "blocked:pubkeys";
const BLOCKED_WORDS_KEY: &str = "blocked:words";
const BLOCKED_IPS_KEY: &str = "blocked:ips";
const TEMP_BAN_KEY_PREFIX: &str = "tempban:";
const MODERATORS_KEY: &str = "moderators";

/// Denylist record store: blocked pubkeys, words, IPs, temporary bans and
/// moderator credentials, all backed by the Redis record store.
///
/// Temporary bans are written with a TTL so expiry is enforced by the store
/// itself - an expired ban simply stops existing.
#[derive(Clone)]
pub struct BanlistStore {
    redis: RedisClient,
}

impl BanlistStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    // --- blocked public keys ---

    pub async fn list_blocked_pubkeys(&self) -> Result<Vec<BlockedPubkey>> {
        let entries = self
            .redis
            .hgetall(BLOCKED_PUBKEYS_KEY)
            .await
            .map_err(|e| anyhow!("Failed to list blocked pubkeys: {}", e))?;

        let mut records: Vec<BlockedPubkey> = entries
            .values()
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect();
        records.sort_by(|a, b| a.blocked_at.cmp(&b.blocked_at));
        Ok(records)
    }

    pub async fn get_blocked_pubkey(&self, pubkey: &str) -> Result<Option<BlockedPubkey>> {
        match self
            .redis
            .hget(BLOCKED_PUBKEYS_KEY, pubkey)
            .await
            .map_err(|e| anyhow!("Failed to get blocked pubkey: {}", e))?
        {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Block a public key. If it is already blocked, a missing ban reason is
    /// backfilled from the request and the existing record is returned.
    /// The boolean is true when the key was already blocked.
    pub async fn add_blocked_pubkey(
        &self,
        pubkey: &str,
        npub: Option<String>,
        ban_reason: Option<String>,
    ) -> Result<(BlockedPubkey, bool)> {
        if let Some(mut existing) = self.get_blocked_pubkey(pubkey).await? {
            if existing.ban_reason.is_none() && ban_reason.is_some() {
                existing.ban_reason = ban_reason;
                self.put_blocked_pubkey(&existing).await?;
            }
            return Ok((existing, true));
        }

        let record = BlockedPubkey {
            pubkey: pubkey.to_string(),
            npub,
            ban_reason,
            blocked_at: Utc::now(),
        };
        self.put_blocked_pubkey(&record).await?;
        Ok((record, false))
    }

    pub async fn remove_blocked_pubkey(&self, pubkey: &str) -> Result<bool> {
        let removed = self
            .redis
            .hdel(BLOCKED_PUBKEYS_KEY, pubkey)
            .await
            .map_err(|e| anyhow!("Failed to remove blocked pubkey: {}", e))?;
        Ok(removed > 0)
    }

    /// Set or clear the ban reason. Returns None when the key is not blocked.
    pub async fn update_ban_reason(
        &self,
        pubkey: &str,
        reason: Option<String>,
    ) -> Result<Option<BlockedPubkey>> {
        let Some(mut record) = self.get_blocked_pubkey(pubkey).await? else {
            return Ok(None);
        };
        record.ban_reason = reason;
        self.put_blocked_pubkey(&record).await?;
        Ok(Some(record))
    }

    async fn put_blocked_pubkey(&self, record: &BlockedPubkey) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.redis
            .hset(BLOCKED_PUBKEYS_KEY, &record.pubkey, &json)
            .await
            .map_err(|e| anyhow!("Failed to store blocked pubkey: {}", e))?;
        Ok(())
    }

    // --- blacklisted words ---

    pub async fn list_blocked_words(&self) -> Result<Vec<BlockedWord>> {
        let entries = self
            .redis
            .hgetall(BLOCKED_WORDS_KEY)
            .await
            .map_err(|e| anyhow!("Failed to list blocked words: {}", e))?;

        let mut records: Vec<BlockedWord> = entries
            .values()
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect();
        records.sort_by(|a, b| a.blocked_at.cmp(&b.blocked_at));
        Ok(records)
    }

    /// Blacklist a word or phrase. Returns None when it is already present.
    pub async fn add_blocked_word(&self, word: &str) -> Result<Option<BlockedWord>> {
        let existing = self
            .redis
            .hget(BLOCKED_WORDS_KEY, word)
            .await
            .map_err(|e| anyhow!("Failed to check blocked word: {}", e))?;
        if existing.is_some() {
            return Ok(None);
        }

        let record = BlockedWord {
            word: word.to_string(),
            blocked_at: Utc::now(),
        };
        let json = serde_json::to_string(&record)?;
        self.redis
            .hset(BLOCKED_WORDS_KEY, word, &json)
            .await
            .map_err(|e| anyhow!("Failed to store blocked word: {}", e))?;
        Ok(Some(record))
    }

    pub async fn remove_blocked_word(&self, word: &str) -> Result<bool> {
        let removed = self
            .redis
            .hdel(BLOCKED_WORDS_KEY, word)
            .await
            .map_err(|e| anyhow!("Failed to remove blocked word: {}", e))?;
        Ok(removed > 0)
    }

    // --- blocked IPs ---

    pub async fn list_blocked_ips(&self) -> Result<Vec<BlockedIp>> {
        let entries = self
            .redis
            .hgetall(BLOCKED_IPS_KEY)
            .await
            .map_err(|e| anyhow!("Failed to list blocked IPs: {}", e))?;

        let mut records: Vec<BlockedIp> = entries
            .values()
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect();
        records.sort_by(|a, b| a.blocked_at.cmp(&b.blocked_at));
        Ok(records)
    }

    /// Block an IP address. Returns None when it is already blocked.
    pub async fn add_blocked_ip(
        &self,
        ip: &str,
        ban_reason: Option<String>,
    ) -> Result<Option<BlockedIp>> {
        let existing = self
            .redis
            .hget(BLOCKED_IPS_KEY, ip)
            .await
            .map_err(|e| anyhow!("Failed to check blocked IP: {}", e))?;
        if existing.is_some() {
            return Ok(None);
        }

        let record = BlockedIp {
            ip: ip.to_string(),
            ban_reason,
            blocked_at: Utc::now(),
        };
        let json = serde_json::to_string(&record)?;
        self.redis
            .hset(BLOCKED_IPS_KEY, ip, &json)
            .await
            .map_err(|e| anyhow!("Failed to store blocked IP: {}", e))?;
        Ok(Some(record))
    }

    pub async fn remove_blocked_ip(&self, ip: &str) -> Result<bool> {
        let removed = self
            .redis
            .hdel(BLOCKED_IPS_KEY, ip)
            .await
            .map_err(|e| anyhow!("Failed to remove blocked IP: {}", e))?;
        Ok(removed > 0)
    }

    // --- temporary bans ---

    /// Apply a temporary ban to a public key. Overwrites any existing ban.
    pub async fn apply_temp_ban(&self, pubkey: &str, duration_secs: u64) -> Result<TempBan> {
        let record = TempBan {
            pubkey: pubkey.to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(duration_secs as i64),
        };
        let json = serde_json::to_string(&record)?;
        let key = format!("{}{}", TEMP_BAN_KEY_PREFIX, pubkey);
        self.redis
            .set_ex(&key, &json, duration_secs)
            .await
            .map_err(|e| anyhow!("Failed to apply temp ban: {}", e))?;
        Ok(record)
    }

    /// Look up an active temporary ban. Expired bans no longer exist in the
    /// store, so a Some result is always active.
    pub async fn get_temp_ban(&self, pubkey: &str) -> Result<Option<TempBan>> {
        let key = format!("{}{}", TEMP_BAN_KEY_PREFIX, pubkey);
        match self
            .redis
            .get(&key)
            .await
            .map_err(|e| anyhow!("Failed to get temp ban: {}", e))?
        {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn remove_temp_ban(&self, pubkey: &str) -> Result<bool> {
        let key = format!("{}{}", TEMP_BAN_KEY_PREFIX, pubkey);
        let removed = self
            .redis
            .del(&key)
            .await
            .map_err(|e| anyhow!("Failed to remove temp ban: {}", e))?;
        Ok(removed > 0)
    }

    pub async fn list_temp_bans(&self) -> Result<Vec<TempBan>> {
        let keys = self
            .redis
            .keys(&format!("{}*", TEMP_BAN_KEY_PREFIX))
            .await
            .map_err(|e| anyhow!("Failed to list temp bans: {}", e))?;

        let mut records = Vec::new();
        for key in keys {
            if let Ok(Some(json)) = self.redis.get(&key).await {
                if let Ok(record) = serde_json::from_str::<TempBan>(&json) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        Ok(records)
    }

    // --- moderator credentials ---

    /// Register a moderator key digest (keys are stored hashed, never in the clear)
    pub async fn add_moderator(&self, key_digest: &str) -> Result<bool> {
        let added = self
            .redis
            .sadd(MODERATORS_KEY, key_digest)
            .await
            .map_err(|e| anyhow!("Failed to add moderator: {}", e))?;
        Ok(added > 0)
    }

    pub async fn remove_moderator(&self, key_digest: &str) -> Result<bool> {
        let removed = self
            .redis
            .srem(MODERATORS_KEY, key_digest)
            .await
            .map_err(|e| anyhow!("Failed to remove moderator: {}", e))?;
        Ok(removed > 0)
    }

    pub async fn is_moderator(&self, key_digest: &str) -> Result<bool> {
        self.redis
            .sismember(MODERATORS_KEY, key_digest)
            .await
            .map_err(|e| anyhow!("Failed to check moderator key: {}", e))
    }
}
