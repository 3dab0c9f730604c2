//! FolderCache - one file per key
//!
//! # ファイル形式
//! - パス: `<dir>/<key>.cache`
//! - 内容: JSON 配列 `[value, expires_at]`（`expires_at == 0` は無期限、それ以外は unix 秒）
//!
//! # エラー方針
//! - I/O やデコードの失敗はエラーにせず `false` / 未存在 / `0` に縮退する
//! - 縮退した操作は `tracing::warn!` で記録する

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use crate::value::Value;

use super::{CacheDriver, CacheEntry};

const SUFFIX: &str = ".cache";

#[derive(Debug, Clone)]
pub struct FolderCache {
    dir: PathBuf,
}

impl FolderCache {
    /// The directory is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{SUFFIX}"))
    }
}

impl CacheDriver for FolderCache {
    fn name(&self) -> &str {
        "folder"
    }

    fn location(&self) -> Option<String> {
        Some(self.dir.display().to_string())
    }

    fn get(&self, key: &str) -> CacheEntry {
        let raw = match fs::read_to_string(self.file(key)) {
            Ok(raw) if !raw.trim().is_empty() => raw,
            Ok(_) => return CacheEntry::missing(),
            Err(err) if err.kind() == ErrorKind::NotFound => return CacheEntry::missing(),
            Err(err) => {
                warn!(key, error = %err, "cache read failed");
                return CacheEntry::missing();
            }
        };

        match serde_json::from_str::<(Value, i64)>(&raw) {
            Ok((value, expires_at)) => CacheEntry::stored(value, expires_at, Utc::now().timestamp()),
            Err(err) => {
                warn!(key, error = %err, "cache entry is corrupt");
                CacheEntry::missing()
            }
        }
    }

    fn set(&self, key: &str, value: &Value, ttl: i64) -> bool {
        let expires_at = match ttl {
            0 => 0,
            ttl => Utc::now().timestamp() + ttl,
        };
        let payload = match serde_json::to_string(&(value, expires_at)) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "cache value not serializable");
                return false;
            }
        };
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %err, "cache dir not writable");
            return false;
        }
        match fs::write(self.file(key), payload) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "cache write failed");
                false
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        fs::remove_file(self.file(key)).is_ok()
    }

    fn clear(&self, prefix: Option<&str>, suffix: Option<&str>) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(key) = file_name.to_str().and_then(|name| name.strip_suffix(SUFFIX)) else {
                continue;
            };
            if prefix.is_some_and(|p| !key.starts_with(p)) || suffix.is_some_and(|s| !key.ends_with(s)) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => warn!(key, error = %err, "cache clear failed"),
            }
        }
        removed
    }
}
