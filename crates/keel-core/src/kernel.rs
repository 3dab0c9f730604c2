//! Kernel - context, container and dispatcher behind one handle
//!
//! # 使用例
//! ```ignore
//! let kernel = Kernel::builder()
//!     .config(KernelConfig::from_file("keel.json")?)
//!     .on_context_set("DB", |kernel, rest, value| { /* reconnect */ })
//!     .build();
//!
//! kernel.set("app.name", "keel");
//! let name = kernel.get("app.name");
//! ```
//!
//! # 内部可変性
//! - すべての操作は `&Kernel` を受け取る（`RefCell` による内部可変性）
//! - ユーザーコード（factory, listener, hook）の実行中は borrow を保持しない
//! - そのため listener 内から dispatch / make / set を呼んでもよい

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cache::{self, CacheDriver};
use crate::config::KernelConfig;
use crate::container::Container;
use crate::events::Dispatcher;
use crate::value::{Map, Value};

/// Called after `set(key, value)` with the segments below the hooked key.
pub type SetHook = Rc<dyn Fn(&Kernel, &[String], &Value)>;

/// Called after `remove`, or before any resolution of the hooked key.
pub type PathHook = Rc<dyn Fn(&Kernel, &[String])>;

/// Context hooks, keyed by the first path segment.
#[derive(Clone, Default)]
pub(crate) struct ContextHooks {
    set: HashMap<String, SetHook>,
    remove: HashMap<String, PathHook>,
    prepare: HashMap<String, PathHook>,
}

impl ContextHooks {
    pub(crate) fn set_hook<'a>(&'a self, parts: &'a [String]) -> Option<(&'a SetHook, &'a [String])> {
        let (first, rest) = parts.split_first()?;
        self.set.get(first).map(|hook| (hook, rest))
    }

    pub(crate) fn remove_hook<'a>(&'a self, parts: &'a [String]) -> Option<(&'a PathHook, &'a [String])> {
        let (first, rest) = parts.split_first()?;
        self.remove.get(first).map(|hook| (hook, rest))
    }

    pub(crate) fn prepare_hook<'a>(&'a self, parts: &'a [String]) -> Option<(&'a PathHook, &'a [String])> {
        let (first, rest) = parts.split_first()?;
        self.prepare.get(first).map(|hook| (hook, rest))
    }
}

pub struct Kernel {
    pub(crate) context: RefCell<Map>,
    pub(crate) hooks: ContextHooks,
    pub(crate) container: Container,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) cache: RefCell<Option<Rc<dyn CacheDriver>>>,
}

impl Kernel {
    /// Kernel with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    pub fn from_config(config: KernelConfig) -> Self {
        Self::builder().config(config).build()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("context", &self.context.borrow().keys().collect::<Vec<_>>())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// KernelBuilder はカーネルの構築と bootstrap を担当
///
/// # bootstrap の順序
/// 1. `PROJECT`, `TMP`, `ENV`, `DEBUG`, `CACHE*` を context に直接書き込む（hook なし）
/// 2. 設定の `context` を `all_set` で書き込む（hook あり）
/// 3. 設定の `cache` を `set("CACHE", ..)` で書き込む（cache hook が driver を選ぶ）
pub struct KernelBuilder {
    config: KernelConfig,
    hooks: ContextHooks,
}

impl KernelBuilder {
    pub fn new() -> Self {
        let mut hooks = ContextHooks::default();
        hooks
            .set
            .insert(cache::CACHE_KEY.to_string(), Rc::new(cache::on_cache_set));
        Self {
            config: KernelConfig::default(),
            hooks,
        }
    }

    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds one initial context entry; the key may be a dotted path.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.context.insert(key.into(), value.into());
        self
    }

    /// Replaces any hook already registered for `key`, the built-in
    /// `CACHE` hook included.
    pub fn on_context_set<F>(mut self, key: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Kernel, &[String], &Value) + 'static,
    {
        self.hooks.set.insert(key.into(), Rc::new(hook));
        self
    }

    pub fn on_context_remove<F>(mut self, key: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Kernel, &[String]) + 'static,
    {
        self.hooks.remove.insert(key.into(), Rc::new(hook));
        self
    }

    pub fn on_context_prepare<F>(mut self, key: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Kernel, &[String]) + 'static,
    {
        self.hooks.prepare.insert(key.into(), Rc::new(hook));
        self
    }

    pub fn build(self) -> Kernel {
        let KernelBuilder { config, hooks } = self;
        let project = config.project_dir();
        let tmp = config.tmp_dir(&project);

        let mut context = Map::new();
        context.insert("PROJECT".into(), Value::from(path_string(&project)));
        context.insert("TMP".into(), Value::from(path_string(&tmp)));
        context.insert("ENV".into(), Value::from(config.env.clone()));
        context.insert("DEBUG".into(), Value::from(config.debug));
        context.insert(cache::CACHE_KEY.into(), Value::Null);
        context.insert(cache::DRIVER_KEY.into(), Value::Null);
        context.insert(cache::REF_KEY.into(), Value::Null);

        let kernel = Kernel {
            context: RefCell::new(context),
            hooks,
            container: Container::default(),
            dispatcher: Dispatcher::default(),
            cache: RefCell::new(None),
        };

        tracing::debug!(env = %config.env, project = %project.display(), "kernel bootstrap");
        kernel.all_set(config.context, None);
        if let Some(dsn) = config.cache {
            kernel.set(cache::CACHE_KEY, dsn);
        }
        kernel
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes backslashes to forward slashes.
pub fn slash(path: &str) -> String {
    path.replace('\\', "/")
}

fn path_string(path: &Path) -> String {
    slash(&path.display().to_string())
}

pub(crate) fn join(dir: &str, child: &str) -> PathBuf {
    Path::new(dir).join(child)
}
