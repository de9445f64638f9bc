use crate::banlist::BanlistStore;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

const PUBKEYS_FILE: &str = "blocked_pubkeys.txt";
const WORDS_FILE: &str = "blocked_words.txt";
const IPS_FILE: &str = "blocked_ips.txt";
const TEMP_BANS_FILE: &str = "temp_bans.txt";

/// Create the lists directory and its files if they are missing
pub async fn ensure_lists_dir(dir: &str) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create lists directory {}", dir))?;

    for file in [PUBKEYS_FILE, WORDS_FILE, IPS_FILE, TEMP_BANS_FILE] {
        let path = Path::new(dir).join(file);
        if tokio::fs::metadata(&path).await.is_err() {
            tokio::fs::write(&path, "")
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub pubkeys: usize,
    pub words: usize,
    pub ips: usize,
    pub temp_bans: usize,
}

/// Write all denylists as plain text, one entry per line
pub async fn export_all(dir: &str, store: &BanlistStore) -> Result<ExportSummary> {
    ensure_lists_dir(dir).await?;

    let pubkeys = store.list_blocked_pubkeys().await?;
    let words = store.list_blocked_words().await?;
    let ips = store.list_blocked_ips().await?;
    let temp_bans = store.list_temp_bans().await?;

    write_lines(
        dir,
        PUBKEYS_FILE,
        pubkeys.iter().map(|p| p.pubkey.clone()),
    )
    .await?;
    write_lines(dir, WORDS_FILE, words.iter().map(|w| w.word.clone())).await?;
    write_lines(dir, IPS_FILE, ips.iter().map(|i| i.ip.clone())).await?;
    write_lines(
        dir,
        TEMP_BANS_FILE,
        temp_bans
            .iter()
            .map(|b| format!("{} {}", b.pubkey, b.expires_at.to_rfc3339())),
    )
    .await?;

    Ok(ExportSummary {
        pubkeys: pubkeys.len(),
        words: words.len(),
        ips: ips.len(),
        temp_bans: temp_bans.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub pubkeys: usize,
    pub words: usize,
    pub ips: usize,
}

/// Re-add denylist entries from the text files. Temporary bans are not
/// imported since their original expiry cannot be reconstructed reliably.
pub async fn import_all(dir: &str, store: &BanlistStore) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        pubkeys: 0,
        words: 0,
        ips: 0,
    };

    for pubkey in read_lines(dir, PUBKEYS_FILE).await? {
        store.add_blocked_pubkey(&pubkey, None, None).await?;
        summary.pubkeys += 1;
    }
    for word in read_lines(dir, WORDS_FILE).await? {
        store.add_blocked_word(&word).await?;
        summary.words += 1;
    }
    for ip in read_lines(dir, IPS_FILE).await? {
        store.add_blocked_ip(&ip, None).await?;
        summary.ips += 1;
    }

    Ok(summary)
}

async fn write_lines(
    dir: &str,
    file: &str,
    lines: impl Iterator<Item = String>,
) -> Result<()> {
    let path = Path::new(dir).join(file);
    let mut contents = lines.collect::<Vec<_>>().join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn read_lines(dir: &str, file: &str) -> Result<Vec<String>> {
    let path = Path::new(dir).join(file);
    if tokio::fs::metadata(&path).await.is_err() {
        return Ok(Vec::new());
    }
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_creates_directory_and_files() {
        let dir = std::env::temp_dir().join(format!("banlist-lists-{}", std::process::id()));
        let dir = dir.to_str().unwrap().to_string();

        ensure_lists_dir(&dir).await.unwrap();
        for file in [PUBKEYS_FILE, WORDS_FILE, IPS_FILE, TEMP_BANS_FILE] {
            assert!(Path::new(&dir).join(file).exists(), "{} missing", file);
        }

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn read_lines_skips_blanks_and_missing_files() {
        let dir = std::env::temp_dir().join(format!("banlist-read-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let dir_str = dir.to_str().unwrap();

        tokio::fs::write(dir.join(WORDS_FILE), "spam\n\n  \nscam\n")
            .await
            .unwrap();
        assert_eq!(
            read_lines(dir_str, WORDS_FILE).await.unwrap(),
            vec!["spam", "scam"]
        );
        assert!(read_lines(dir_str, IPS_FILE).await.unwrap().is_empty());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
