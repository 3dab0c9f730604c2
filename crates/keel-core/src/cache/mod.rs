//! Cache drivers and the `CACHE` context key.
//!
//! Writing `CACHE` selects the active driver:
//!
//! - `true` uses a folder under `<TMP>/cache`;
//! - `"folder=<dir>"` (or `"dir=<dir>"`, any case) uses a folder at `<dir>`;
//! - anything else disables caching.
//!
//! The selection is mirrored into `CACHE_DRIVER` and `CACHE_REF`.

mod folder;

use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::kernel::{self, Kernel};
use crate::value::Value;

pub use folder::FolderCache;

pub(crate) const CACHE_KEY: &str = "CACHE";
pub(crate) const DRIVER_KEY: &str = "CACHE_DRIVER";
pub(crate) const REF_KEY: &str = "CACHE_REF";

static FOLDER_DSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:dir|folder)\s*=\s*(.+)$").expect("folder dsn pattern"));

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheEntry {
    /// `None` when missing or expired.
    pub value: Option<Value>,
    pub exists: bool,
    pub expired: bool,
}

impl CacheEntry {
    pub fn missing() -> Self {
        Self::default()
    }

    /// Entry read from storage, judged against `now` (unix seconds).
    pub fn stored(value: Value, expires_at: i64, now: i64) -> Self {
        let expired = expires_at > 0 && expires_at < now;
        Self {
            value: (!expired).then_some(value),
            exists: true,
            expired,
        }
    }
}

/// Storage behind the kernel's cache helpers.
///
/// Failures never surface as errors: they read as missing entries, `false`
/// or `0`.
pub trait CacheDriver {
    /// Short driver name, written to `CACHE_DRIVER`.
    fn name(&self) -> &str;

    /// Where the driver stores data, written to `CACHE_REF`.
    fn location(&self) -> Option<String> {
        None
    }

    fn get(&self, key: &str) -> CacheEntry;

    /// `ttl` in seconds; `0` never expires, negative is already expired.
    fn set(&self, key: &str, value: &Value, ttl: i64) -> bool;

    fn remove(&self, key: &str) -> bool;

    /// Removes every key matching both filters; returns how many went.
    fn clear(&self, prefix: Option<&str>, suffix: Option<&str>) -> usize;
}

/// Parsed value of the `CACHE` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDsn {
    Folder(String),
}

impl CacheDsn {
    /// `tmp` is the kernel's `TMP` directory.
    pub fn parse(value: &Value, tmp: &str) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(CacheDsn::Folder(kernel::slash(
                &kernel::join(tmp, "cache").display().to_string(),
            ))),
            Value::Str(dsn) => FOLDER_DSN
                .captures(dsn.trim())
                .and_then(|caps| caps.get(1))
                .map(|dir| CacheDsn::Folder(dir.as_str().trim().to_string())),
            _ => None,
        }
    }

    fn driver(&self) -> Rc<dyn CacheDriver> {
        match self {
            CacheDsn::Folder(dir) => Rc::new(FolderCache::new(dir)),
        }
    }
}

/// Built-in set hook for `CACHE`.
pub(crate) fn on_cache_set(kernel: &Kernel, rest: &[String], value: &Value) {
    if !rest.is_empty() {
        return;
    }
    let tmp = kernel.get("TMP");
    let driver = CacheDsn::parse(value, tmp.as_str().unwrap_or_default()).map(|dsn| dsn.driver());
    kernel.use_cache_driver(driver);
}

impl Kernel {
    /// Installs (or, with `None`, removes) the active cache driver.
    pub fn use_cache_driver(&self, driver: Option<Rc<dyn CacheDriver>>) -> &Self {
        let (name, location) = match &driver {
            Some(driver) => (Value::from(driver.name()), Value::from(driver.location())),
            None => (Value::Null, Value::Null),
        };
        debug!(driver = ?name, location = ?location, "cache driver");
        *self.cache.borrow_mut() = driver;
        self.set(DRIVER_KEY, name).set(REF_KEY, location)
    }

    pub fn cache_driver(&self) -> Option<Rc<dyn CacheDriver>> {
        self.cache.borrow().clone()
    }

    pub fn cache_entry(&self, key: &str) -> CacheEntry {
        self.cache_driver()
            .map_or_else(CacheEntry::missing, |driver| driver.get(key))
    }

    /// Stored and not expired.
    pub fn cache_has(&self, key: &str) -> bool {
        let entry = self.cache_entry(key);
        entry.exists && !entry.expired
    }

    pub fn cache_get(&self, key: &str) -> Option<Value> {
        self.cache_entry(key).value
    }

    pub fn cache_set(&self, key: &str, value: impl Into<Value>, ttl: i64) -> bool {
        let value = value.into();
        self.cache_driver()
            .is_some_and(|driver| driver.set(key, &value, ttl))
    }

    pub fn cache_remove(&self, key: &str) -> bool {
        self.cache_driver().is_some_and(|driver| driver.remove(key))
    }

    pub fn cache_clear(&self, prefix: Option<&str>, suffix: Option<&str>) -> usize {
        self.cache_driver()
            .map_or(0, |driver| driver.clear(prefix, suffix))
    }
}
