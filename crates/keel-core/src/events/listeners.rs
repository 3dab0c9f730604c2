//! Listener tables - イベント名ごとの listener 管理
//!
//! # 設計
//! - テーブルは挿入順の `IndexMap`（id 指定の再登録は同じ位置で上書き）
//! - ソート済みスナップショット（優先度の降順、同順位は挿入順）をキャッシュ
//! - テーブルを変更するたびにそのイベント名のキャッシュを破棄
//! - 自動キーは dispatcher 全体で単調増加するため、`off` の後に登録された
//!   listener が古い one-shot の削除に巻き込まれることはない

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::container::signature::Callable;

/// Priority used when none is given. Higher runs first.
pub const DEFAULT_PRIORITY: i32 = -1;

/// A listener registration.
///
/// ```ignore
/// kernel.listen("boot", Listener::new("Mailer@flush").priority(10).id("mailer"));
/// ```
#[derive(Debug, Clone)]
pub struct Listener {
    handler: Callable,
    priority: i32,
    once: bool,
    id: Option<String>,
}

impl Listener {
    pub fn new(handler: impl Into<Callable>) -> Self {
        Self {
            handler: handler.into(),
            priority: DEFAULT_PRIORITY,
            once: false,
            id: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Removed after its first call.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Registering another listener with the same id replaces this one in place.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ListenerKey {
    Auto(u64),
    Id(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) key: ListenerKey,
    pub(crate) handler: Callable,
    pub(crate) priority: i32,
    pub(crate) once: bool,
}

#[derive(Debug, Default)]
struct Table {
    entries: IndexMap<ListenerKey, Entry>,
    sorted: Option<Rc<[Entry]>>,
}

impl Table {
    fn snapshot(&mut self) -> Rc<[Entry]> {
        if let Some(sorted) = &self.sorted {
            return Rc::clone(sorted);
        }
        let mut list: Vec<Entry> = self.entries.values().cloned().collect();
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
        let sorted: Rc<[Entry]> = list.into();
        self.sorted = Some(Rc::clone(&sorted));
        sorted
    }
}

/// Listener tables keyed by event name.
#[derive(Debug, Default)]
pub struct Dispatcher {
    tables: RefCell<HashMap<String, Table>>,
    next_key: Cell<u64>,
}

impl Dispatcher {
    pub(crate) fn listen(&self, name: &str, listener: Listener) {
        let key = match listener.id {
            Some(id) => ListenerKey::Id(id),
            None => {
                let next = self.next_key.get();
                self.next_key.set(next + 1);
                ListenerKey::Auto(next)
            }
        };
        let entry = Entry {
            key: key.clone(),
            handler: listener.handler,
            priority: listener.priority,
            once: listener.once,
        };

        let mut tables = self.tables.borrow_mut();
        let table = tables.entry(name.to_string()).or_default();
        table.entries.insert(key, entry);
        table.sorted = None;
    }

    /// With an id, removes that listener; otherwise drops the whole table.
    pub(crate) fn off(&self, name: &str, id: Option<&str>) {
        match id {
            Some(id) => self.remove(name, &ListenerKey::Id(id.to_string())),
            None => {
                self.tables.borrow_mut().remove(name);
            }
        }
    }

    pub(crate) fn remove(&self, name: &str, key: &ListenerKey) {
        let mut tables = self.tables.borrow_mut();
        if let Some(table) = tables.get_mut(name) {
            if table.entries.shift_remove(key).is_some() {
                table.sorted = None;
            }
        }
    }

    /// Sorted listeners of `name`; empty when none are registered.
    pub(crate) fn snapshot(&self, name: &str) -> Rc<[Entry]> {
        match self.tables.borrow_mut().get_mut(name) {
            Some(table) => table.snapshot(),
            None => Rc::from(Vec::new()),
        }
    }

    pub(crate) fn forget(&self, name: &str) {
        self.tables.borrow_mut().remove(name);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.tables
            .borrow()
            .get(name)
            .map_or(0, |table| table.entries.len())
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }
}
