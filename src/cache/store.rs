//! Disk-backed audio store.

use super::fingerprint::sanitize_key;
use super::stats::{CacheHealth, CacheStatistics};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const AUDIO_EXT: &str = "mp3";
const SIDECAR_EXT: &str = "json";

/// Configuration for the audio cache.
#[derive(Debug, Clone)]
pub struct AudioCacheConfig {
    pub dir: PathBuf,
    /// Total size cap in megabytes.
    pub max_size_mb: u64,
    /// Age after which an entry is considered expired.
    pub ttl: Duration,
}

impl AudioCacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_size_mb: 50,
            ttl: Duration::from_secs(24 * 3600),
        }
    }

    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_mb = mb;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_ttl_hours(self, hours: u64) -> Self {
        self.with_ttl(Duration::from_secs(hours * 3600))
    }
}

/// Generation metadata stored next to the audio, used to validate freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub intent_id: String,
    pub voice_id: String,
    pub duration_secs: f64,
}

/// One cached artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub path: PathBuf,
    pub size_kb: u64,
    pub created_at: DateTime<Utc>,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}

/// Result of a cache lookup: the entry plus whether it is still fresh.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub entry: CacheEntry,
    pub fresh: bool,
}

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_removed: usize,
    pub evicted_for_size: usize,
}

/// Disk-backed store for synthesized audio, keyed by fingerprint.
///
/// All mutations and the statistics snapshot serialize through one async
/// lock, so concurrent stores with distinct keys cannot corrupt each other's
/// files or the aggregates. Hit/miss counters follow fetches across the
/// lifetime of this instance.
pub struct AudioCache {
    config: AudioCacheConfig,
    index: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AudioCache {
    /// Open a cache over `config.dir`, creating the directory if needed and
    /// rebuilding the index from metadata sidecars left by earlier sessions.
    pub async fn open(config: AudioCacheConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.dir).await?;
        let index = Self::rebuild_index(&config.dir).await?;
        if !index.is_empty() {
            info!(entries = index.len(), dir = %config.dir.display(), "reopened audio cache");
        }
        Ok(Self {
            config,
            index: Mutex::new(index),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    async fn rebuild_index(dir: &Path) -> Result<HashMap<String, CacheEntry>> {
        let mut index = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(dirent) = entries.next_entry().await? {
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SIDECAR_EXT) {
                continue;
            }
            let raw = match tokio::fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(sidecar = %path.display(), error = %e, "skipping unreadable sidecar");
                    continue;
                }
            };
            match serde_json::from_slice::<CacheEntry>(&raw) {
                Ok(entry) if entry.path.exists() => {
                    index.insert(entry.key.clone(), entry);
                }
                Ok(entry) => {
                    debug!(key = %entry.key, "sidecar without audio file, dropping");
                    let _ = tokio::fs::remove_file(&path).await;
                }
                Err(e) => {
                    warn!(sidecar = %path.display(), error = %e, "skipping corrupt sidecar");
                }
            }
        }
        Ok(index)
    }

    fn audio_path(&self, name: &str) -> PathBuf {
        self.config.dir.join(format!("{name}.{AUDIO_EXT}"))
    }

    fn sidecar_path(&self, name: &str) -> PathBuf {
        self.config.dir.join(format!("{name}.{SIDECAR_EXT}"))
    }

    /// Persist `bytes` under `key`, overwriting any existing entry.
    ///
    /// Returns the path of the written audio file.
    pub async fn store(&self, bytes: &[u8], key: &str, metadata: EntryMetadata) -> Result<PathBuf> {
        if bytes.is_empty() {
            return Err(Error::InvalidData("audio payload is empty".into()));
        }
        if key.trim().is_empty() {
            return Err(Error::InvalidKey("cache key is empty".into()));
        }
        let name = sanitize_key(key);
        if name.is_empty() {
            return Err(Error::InvalidKey(format!(
                "cache key \"{key}\" contains only reserved characters"
            )));
        }

        let mut index = self.index.lock().await;
        let path = self.audio_path(&name);
        let entry = CacheEntry {
            key: name.clone(),
            path: path.clone(),
            size_kb: (bytes.len() as u64).div_ceil(1024),
            created_at: Utc::now(),
            metadata,
        };

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::CachingFailed(format!("writing {}: {e}", path.display())))?;
        let sidecar = serde_json::to_vec_pretty(&entry)?;
        tokio::fs::write(self.sidecar_path(&name), sidecar)
            .await
            .map_err(|e| Error::CachingFailed(format!("writing sidecar for {name}: {e}")))?;

        if index.insert(name.clone(), entry).is_some() {
            debug!(key = %name, "overwrote existing cache entry");
        }
        Ok(path)
    }

    /// Look up an entry by key. `fresh` is false once the entry is past the
    /// configured TTL; absence returns `None`.
    pub async fn fetch(&self, key: &str) -> Option<CacheLookup> {
        let name = sanitize_key(key);
        let index = self.index.lock().await;
        match index.get(&name) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(CacheLookup {
                    fresh: !entry.is_expired(self.config.ttl, Utc::now()),
                    entry: entry.clone(),
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Remove one entry and its backing files. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let name = sanitize_key(key);
        let mut index = self.index.lock().await;
        Ok(self.remove_locked(&mut index, &name).await)
    }

    /// Remove all entries and their backing files.
    pub async fn clear(&self) -> Result<()> {
        let mut index = self.index.lock().await;
        let keys: Vec<String> = index.keys().cloned().collect();
        for key in keys {
            self.remove_locked(&mut index, &key).await;
        }
        Ok(())
    }

    async fn remove_locked(&self, index: &mut HashMap<String, CacheEntry>, name: &str) -> bool {
        let Some(entry) = index.remove(name) else {
            return false;
        };
        if let Err(e) = tokio::fs::remove_file(&entry.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key = %name, error = %e, "failed to delete audio file");
            }
        }
        let _ = tokio::fs::remove_file(self.sidecar_path(name)).await;
        true
    }

    /// Drop expired entries, then evict oldest-first until the total size is
    /// back under the cap. Idempotent and safe on an empty cache.
    pub async fn perform_maintenance(&self) -> Result<MaintenanceReport> {
        let mut index = self.index.lock().await;
        let now = Utc::now();
        let mut report = MaintenanceReport::default();

        let expired: Vec<String> = index
            .values()
            .filter(|e| e.is_expired(self.config.ttl, now))
            .map(|e| e.key.clone())
            .collect();
        for key in expired {
            self.remove_locked(&mut index, &key).await;
            report.expired_removed += 1;
        }

        let cap_kb = self.config.max_size_mb * 1024;
        loop {
            let total_kb: u64 = index.values().map(|e| e.size_kb).sum();
            if total_kb <= cap_kb {
                break;
            }
            let oldest = index
                .values()
                .min_by_key(|e| e.created_at)
                .map(|e| e.key.clone());
            match oldest {
                Some(key) => {
                    self.remove_locked(&mut index, &key).await;
                    report.evicted_for_size += 1;
                }
                None => break,
            }
        }

        if report.expired_removed > 0 || report.evicted_for_size > 0 {
            info!(
                expired = report.expired_removed,
                evicted = report.evicted_for_size,
                "audio cache maintenance pass"
            );
        }
        Ok(report)
    }

    /// Consistent snapshot of the cache's aggregate state.
    pub async fn statistics(&self) -> CacheStatistics {
        let index = self.index.lock().await;
        let now = Utc::now();
        let total_items = index.len();
        let total_kb: u64 = index.values().map(|e| e.size_kb).sum();
        let total_size_mb = total_kb as f64 / 1024.0;
        let average_file_size_kb = if total_items == 0 {
            0.0
        } else {
            total_kb as f64 / total_items as f64
        };
        let oldest = index.values().map(|e| e.created_at).min();
        let newest = index.values().map(|e| e.created_at).max();
        let expired_count = index
            .values()
            .filter(|e| e.is_expired(self.config.ttl, now))
            .count();

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        CacheStatistics {
            total_items,
            total_size_mb,
            average_file_size_kb,
            oldest,
            newest,
            expired_count,
            hit_rate,
            health: CacheHealth::classify(total_size_mb, self.config.max_size_mb),
        }
    }

    pub fn config(&self) -> &AudioCacheConfig {
        &self.config
    }
}
