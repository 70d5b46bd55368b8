//! TTL key/value cache with optional per-key disk persistence
//!
//! Resolvers read through this cache before hitting any API. Entries marked
//! persistent are mirrored to one JSON file per key so they survive process
//! restarts; everything else lives only in memory. Disk failures are logged
//! and treated as cache misses, never surfaced to callers.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::GrowcastError;

/// How often expired in-memory entries are dropped
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// How often live persistent entries are re-serialized to disk
const BACKUP_INTERVAL: Duration = Duration::from_secs(60 * 60 * 12);

/// On-disk representation of a persistent entry
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: serde_json::Value,
    expires_at: u64, // Unix timestamp (seconds)
}

#[derive(Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: u64,
    persistent: bool,
}

/// Counts reported by [`TtlCache::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub persistent: usize,
}

/// In-memory TTL cache with a file-per-key persistent backing directory
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    dir: PathBuf,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Replace path-reserved characters so any key maps to a safe filename
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl TtlCache {
    /// Open the cache, restoring persistent entries from the backing directory.
    ///
    /// Backing files whose stored expiry has passed are deleted; corrupt files
    /// are skipped and deleted rather than aborting the restore.
    pub fn open(dir: impl AsRef<Path>) -> crate::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            GrowcastError::cache(format!(
                "failed to create cache directory {}: {e}",
                dir.display()
            ))
        })?;

        let cache = Self {
            entries: Mutex::new(HashMap::new()),
            dir,
        };
        cache.restore();
        Ok(cache)
    }

    /// Retrieve a value if present and not expired, checking the backing file
    /// on a memory miss.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let file_key = sanitize_key(key);
        let now = now_secs();

        {
            let mut entries = self.entries.lock().unwrap();
            match entries.get(&file_key) {
                Some(entry) if now < entry.expires_at => {
                    debug!("key found and still fresh");
                    return serde_json::from_value(entry.value.clone()).ok();
                }
                Some(_) => {
                    debug!("key found but expired");
                    entries.remove(&file_key);
                }
                None => {}
            }
        }

        // Fall through to the per-key backing file
        self.load_from_disk(&file_key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Store a value with a time-to-live.
    ///
    /// Persistent entries are synchronously mirrored to a backing file named
    /// after the sanitized key.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration, persistent: bool) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize cache value for {key}: {e}");
                return;
            }
        };

        let file_key = sanitize_key(key);
        let expires_at = now_secs().saturating_add(ttl.as_secs());
        let entry = CacheEntry {
            value: json,
            expires_at,
            persistent,
        };

        if persistent {
            self.write_to_disk(&file_key, &entry);
        }
        self.entries.lock().unwrap().insert(file_key, entry);
    }

    /// Remove a key from memory and from its backing file, if any
    pub fn remove(&self, key: &str) {
        let file_key = sanitize_key(key);
        self.entries.lock().unwrap().remove(&file_key);

        let path = self.file_path(&file_key);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("failed to remove cache file {}: {e}", path.display());
            }
        }
    }

    /// Drop every expired entry from memory
    pub fn sweep_expired(&self) {
        let now = now_secs();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("swept {removed} expired cache entries");
        }
    }

    /// Re-serialize every live persistent entry to disk.
    ///
    /// Covers entries whose TTL was extended after the initial write.
    pub fn backup_persistent(&self) {
        let snapshot: Vec<(String, CacheEntry)> = {
            let entries = self.entries.lock().unwrap();
            let now = now_secs();
            entries
                .iter()
                .filter(|(_, e)| e.persistent && now < e.expires_at)
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect()
        };

        for (file_key, entry) in &snapshot {
            self.write_to_disk(file_key, entry);
        }
        debug!("backed up {} persistent cache entries", snapshot.len());
    }

    /// Teardown hook: write persistent entries out one final time
    pub fn flush(&self) {
        self.backup_persistent();
    }

    /// Spawn the periodic expiry sweep and persistent backup tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_maintenance(self: &Arc<Self>) {
        let sweeper = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                sweeper.sweep_expired();
            }
        });

        let backer = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(BACKUP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                backer.backup_persistent();
            }
        });
    }

    /// Snapshot counts of the in-memory map
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap();
        let now = now_secs();
        let mut stats = CacheStats {
            total: entries.len(),
            active: 0,
            expired: 0,
            persistent: 0,
        };
        for entry in entries.values() {
            if now < entry.expires_at {
                stats.active += 1;
                if entry.persistent {
                    stats.persistent += 1;
                }
            } else {
                stats.expired += 1;
            }
        }
        stats
    }

    fn file_path(&self, file_key: &str) -> PathBuf {
        self.dir.join(format!("{file_key}.json"))
    }

    fn write_to_disk(&self, file_key: &str, entry: &CacheEntry) {
        let stored = StoredEntry {
            value: entry.value.clone(),
            expires_at: entry.expires_at,
        };
        let path = self.file_path(file_key);
        match serde_json::to_vec(&stored) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&path, bytes) {
                    warn!("failed to write cache file {}: {e}", path.display());
                }
            }
            Err(e) => warn!("failed to serialize cache entry {file_key}: {e}"),
        }
    }

    /// Attempt to rehydrate one entry from its backing file. Expired files
    /// are deleted; unreadable files are treated as misses.
    fn load_from_disk(&self, file_key: &str) -> Option<serde_json::Value> {
        let path = self.file_path(file_key);
        let bytes = fs::read(&path).ok()?;

        let stored: StoredEntry = match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("corrupt cache file {}: {e}", path.display());
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if now_secs() >= stored.expires_at {
            debug!("cache file {} has expired", path.display());
            let _ = fs::remove_file(&path);
            return None;
        }

        let entry = CacheEntry {
            value: stored.value.clone(),
            expires_at: stored.expires_at,
            persistent: true,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(file_key.to_string(), entry);

        Some(stored.value)
    }

    /// Scan the backing directory at startup, loading live entries into
    /// memory and deleting expired or corrupt files.
    fn restore(&self) {
        let reader = match fs::read_dir(&self.dir) {
            Ok(reader) => reader,
            Err(e) => {
                warn!("failed to read cache directory {}: {e}", self.dir.display());
                return;
            }
        };

        let now = now_secs();
        let mut restored = 0usize;

        for dir_entry in reader.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let stored: StoredEntry = match fs::read(&path)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(anyhow::Error::from))
            {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("skipping corrupt cache file {}: {e}", path.display());
                    let _ = fs::remove_file(&path);
                    continue;
                }
            };

            if now >= stored.expires_at {
                let _ = fs::remove_file(&path);
                continue;
            }

            let Some(file_key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            self.entries.lock().unwrap().insert(
                file_key.to_string(),
                CacheEntry {
                    value: stored.value,
                    expires_at: stored.expires_at,
                    persistent: true,
                },
            );
            restored += 1;
        }

        if restored > 0 {
            info!("restored {restored} cache entries from disk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::open(dir.path()).unwrap();

        cache.set("zone:39.74,-104.99", &"5b", Duration::from_secs(60), false);
        assert_eq!(
            cache.get::<String>("zone:39.74,-104.99"),
            Some("5b".to_string())
        );

        cache.remove("zone:39.74,-104.99");
        assert_eq!(cache.get::<String>("zone:39.74,-104.99"), None);
    }

    #[test]
    fn test_expired_entry_is_never_returned() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::open(dir.path()).unwrap();

        cache.set("weather:1.00,2.00", &72.5_f64, Duration::from_secs(1), true);
        std::thread::sleep(Duration::from_millis(2_000));
        assert_eq!(cache.get::<f64>("weather:1.00,2.00"), None);
    }

    #[test]
    fn test_persistent_entry_survives_restart() {
        let dir = TempDir::new().unwrap();

        {
            let cache = TtlCache::open(dir.path()).unwrap();
            cache.set(
                "region:51.51,-0.13",
                &serde_json::json!({"country": "uk"}),
                Duration::from_secs(3600),
                true,
            );
        }

        // Reconstructing from the backing directory simulates a restart
        let reopened = TtlCache::open(dir.path()).unwrap();
        let value: Option<serde_json::Value> = reopened.get("region:51.51,-0.13");
        assert_eq!(value, Some(serde_json::json!({"country": "uk"})));
        assert_eq!(reopened.stats().persistent, 1);
    }

    #[test]
    fn test_non_persistent_entry_does_not_survive_restart() {
        let dir = TempDir::new().unwrap();

        {
            let cache = TtlCache::open(dir.path()).unwrap();
            cache.set("city:10.00,20.00", &"Springfield", Duration::from_secs(3600), false);
        }

        let reopened = TtlCache::open(dir.path()).unwrap();
        assert_eq!(reopened.get::<String>("city:10.00,20.00"), None);
    }

    #[test]
    fn test_restore_deletes_expired_files() {
        let dir = TempDir::new().unwrap();
        let stale = StoredEntry {
            value: serde_json::json!("old"),
            expires_at: 1, // long past
        };
        let path = dir.path().join("zone_old.json");
        fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        let cache = TtlCache::open(dir.path()).unwrap();
        assert_eq!(cache.get::<String>("zone:old"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_backing_file_is_skipped_and_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather_bad.json");
        fs::write(&path, b"{not json").unwrap();

        let cache = TtlCache::open(dir.path()).unwrap();
        assert_eq!(cache.get::<String>("weather:bad"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_key_sanitization_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::open(dir.path()).unwrap();
        let key = "zone:39.74,-104.99";

        cache.set(key, &"7b", Duration::from_secs(3600), true);
        let expected = dir.path().join("zone_39_74_-104_99.json");
        assert!(expected.exists());

        let reopened = TtlCache::open(dir.path()).unwrap();
        assert_eq!(reopened.get::<String>(key), Some("7b".to_string()));
    }

    #[test]
    fn test_sweep_drops_expired_entries() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::open(dir.path()).unwrap();

        cache.set("a", &1, Duration::from_secs(0), false);
        cache.set("b", &2, Duration::from_secs(3600), false);

        cache.sweep_expired();
        let stats = cache.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 1);
    }

    #[test]
    fn test_stats_counts_buckets() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::open(dir.path()).unwrap();

        cache.set("live", &1, Duration::from_secs(3600), false);
        cache.set("live-persistent", &2, Duration::from_secs(3600), true);
        cache.set("dead", &3, Duration::from_secs(0), false);

        let stats = cache.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.persistent, 1);
    }
}
