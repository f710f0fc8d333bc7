//! Process-local response cache between source adapters and collectors.
//!
//! Two implementations behind one trait, per the design notes: a
//! filesystem-backed store for normal operation and a no-op store when
//! caching is globally disabled. Keys are `(source, today's date,
//! stable-hash(params))` so TTL is day-aligned by default; entries are
//! written atomically (write to a temp file, then rename) so a crash never
//! leaves a partial file readable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source: String,
    pub query_params: Value,
    pub cached_at: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub bytes: u64,
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, source: &str, params: &Value) -> Option<Value>;
    async fn set(&self, source: &str, params: &Value, value: Value) -> bool;
    async fn clear(&self, source: Option<&str>) -> usize;
    async fn stats(&self) -> CacheStats;
}

/// Stable fingerprint of a parameter object: sort object keys recursively so
/// that logically-identical params always hash identically.
fn stable_hash(params: &Value) -> String {
    let canonical = canonicalize(params);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonicalize(v: &Value) -> String {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", k, canonicalize(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

fn entry_key(source: &str, params: &Value) -> String {
    let today = Utc::now().format("%Y-%m-%d");
    format!("{}_{}_{}", source, today, &stable_hash(params)[..12])
}

pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self { dir: dir.into(), ttl }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read_entry(&self, path: &Path) -> Option<CacheEntry> {
        let bytes = tokio::fs::read(path).await.ok()?;
        serde_json::from_slice::<CacheEntry>(&bytes).ok()
    }
}

#[async_trait]
impl ResponseCache for DiskCache {
    async fn get(&self, source: &str, params: &Value) -> Option<Value> {
        let key = entry_key(source, params);
        let path = self.path_for(&key);
        let entry = self.read_entry(&path).await?;
        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age.to_std().unwrap_or(Duration::MAX) > self.ttl {
            let _ = tokio::fs::remove_file(&path).await;
            debug!(source, key, "cache entry expired");
            return None;
        }
        debug!(source, key, "cache hit");
        Some(entry.data)
    }

    async fn set(&self, source: &str, params: &Value, value: Value) -> bool {
        if tokio::fs::create_dir_all(&self.dir).await.is_err() {
            return false;
        }
        let key = entry_key(source, params);
        let entry = CacheEntry {
            source: source.to_string(),
            query_params: params.clone(),
            cached_at: Utc::now(),
            data: value,
        };
        let serialized = match serde_json::to_vec_pretty(&entry) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let final_path = self.path_for(&key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp-{}", uuid::Uuid::new_v4()));
        if tokio::fs::write(&tmp_path, &serialized).await.is_err() {
            return false;
        }
        tokio::fs::rename(&tmp_path, &final_path).await.is_ok()
    }

    async fn clear(&self, source: Option<&str>) -> usize {
        let mut removed = 0usize;
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return 0;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let matches = match source {
                Some(s) => name.starts_with(&format!("{s}_")),
                None => name.ends_with(".json"),
            };
            if matches && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        removed
    }

    async fn stats(&self) -> CacheStats {
        let mut entries = 0usize;
        let mut bytes = 0u64;
        if let Ok(mut dir) = tokio::fs::read_dir(&self.dir).await {
            while let Ok(Some(entry)) = dir.next_entry().await {
                if let Ok(meta) = entry.metadata().await {
                    if meta.is_file() {
                        entries += 1;
                        bytes += meta.len();
                    }
                }
            }
        }
        CacheStats {
            enabled: true,
            entries,
            bytes,
        }
    }
}

/// Used when the cache is globally disabled: every read misses, every
/// write is a no-op that reports failure so callers don't believe data was
/// persisted.
pub struct NoopCache;

#[async_trait]
impl ResponseCache for NoopCache {
    async fn get(&self, _source: &str, _params: &Value) -> Option<Value> {
        None
    }

    async fn set(&self, _source: &str, _params: &Value, _value: Value) -> bool {
        false
    }

    async fn clear(&self, _source: Option<&str>) -> usize {
        0
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: false,
            entries: 0,
            bytes: 0,
        }
    }
}
