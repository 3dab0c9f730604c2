//! Context accessors on the kernel.
//!
//! Every key is a dotted path (see [`crate::path`]). Hooks registered on
//! the kernel builder fire on the first segment: prepare hooks before each
//! resolution, set and remove hooks after the write. No context borrow is
//! held while a hook runs.

use crate::kernel::Kernel;
use crate::path::{self, Location, Lookup};
use crate::value::{Map, Value, index_key};

/// Key for [`Kernel::all_get`], optionally reported under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAlias {
    pub alias: Option<String>,
    pub key: String,
}

impl KeyAlias {
    fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.key)
    }
}

impl From<&str> for KeyAlias {
    fn from(key: &str) -> Self {
        Self {
            alias: None,
            key: key.to_string(),
        }
    }
}

impl From<String> for KeyAlias {
    fn from(key: String) -> Self {
        Self { alias: None, key }
    }
}

/// `(alias, key)`
impl From<(&str, &str)> for KeyAlias {
    fn from((alias, key): (&str, &str)) -> Self {
        Self {
            alias: Some(alias.to_string()),
            key: key.to_string(),
        }
    }
}

impl Kernel {
    /// Snapshot of the whole context.
    pub fn context(&self) -> Map {
        self.context.borrow().clone()
    }

    /// Present, or resolves to a truthy value.
    ///
    /// Objects without an existence check still report a member their
    /// getter hands out.
    pub fn has(&self, key: &str) -> bool {
        let lookup = self.lookup(key);
        lookup.found || lookup.value.is_truthy()
    }

    pub fn get(&self, key: &str) -> Value {
        self.lookup(key).value
    }

    pub fn lookup(&self, key: &str) -> Lookup {
        self.prepare(&path::parts(key));
        path::lookup(&self.context.borrow(), key)
    }

    /// Runs `f` on the resolved location.
    ///
    /// The context is mutably borrowed while `f` runs; `f` must not call
    /// back into the kernel's context.
    pub fn resolve<R>(&self, key: &str, create_missing: bool, f: impl FnOnce(Location<'_>) -> R) -> R {
        self.prepare(&path::parts(key));
        path::resolve(&mut self.context.borrow_mut(), key, create_missing, f)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        let parts = path::parts(key);
        self.prepare(&parts);

        let hook = self.hooks.set_hook(&parts);
        let notify = hook.is_some().then(|| value.clone());
        path::resolve(&mut self.context.borrow_mut(), key, true, |loc| *loc.value = value);

        if let (Some((hook, rest)), Some(value)) = (hook, notify) {
            hook(self, rest, &value);
        }
        self
    }

    pub fn remove(&self, key: &str) -> &Self {
        let parts = path::parts(key);
        self.prepare(&parts);
        path::remove(&mut self.context.borrow_mut(), key);

        if let Some((hook, rest)) = self.hooks.remove_hook(&parts) {
            hook(self, rest);
        }
        self
    }

    fn prepare(&self, parts: &[String]) {
        if let Some((hook, rest)) = self.hooks.prepare_hook(parts) {
            hook(self, rest);
        }
    }

    /// Whether any of `keys` is present.
    pub fn all_has<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter().any(|key| self.has(key.as_ref()))
    }

    /// Values of `keys`, reported under their alias when one is given.
    pub fn all_get<I, K>(&self, keys: I) -> Map
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyAlias>,
    {
        keys.into_iter()
            .map(Into::into)
            .map(|key: KeyAlias| (key.label().to_string(), self.get(&key.key)))
            .collect()
    }

    /// Sets every entry, each key prefixed with `prefix` as is (`"db."`
    /// nests, `"db_"` does not).
    pub fn all_set(&self, values: Map, prefix: Option<&str>) -> &Self {
        for (key, value) in values {
            match prefix {
                Some(prefix) => self.set(&format!("{prefix}{key}"), value),
                None => self.set(&key, value),
            };
        }
        self
    }

    pub fn all_remove<I, K>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            self.remove(key.as_ref());
        }
        self
    }

    /// Merges `values` into the collection at `key`.
    ///
    /// String keys overwrite, integer keys are renumbered from 0 and the
    /// new ones appended.
    pub fn merge(&self, key: &str, values: Map) -> &Self {
        let mut target = renumber(into_map(self.get(key)), 0);
        for (k, v) in values {
            if index_key(&k).is_some() {
                let next = next_index(&target);
                target.insert(next.to_string(), v);
            } else {
                target.insert(k, v);
            }
        }
        self.set(key, target)
    }

    pub fn push(&self, key: &str, values: impl IntoIterator<Item = Value>) -> &Self {
        let updated = match collection(self.get(key)) {
            Value::Map(map) => {
                let mut map = renumber(map, 0);
                for value in values {
                    let next = next_index(&map);
                    map.insert(next.to_string(), value);
                }
                Value::Map(map)
            }
            other => {
                let mut items = other.into_list();
                items.extend(values);
                Value::List(items)
            }
        };
        self.set(key, updated)
    }

    /// Removes and returns the last element; `Null` when empty.
    pub fn pop(&self, key: &str) -> Value {
        let (updated, popped) = match collection(self.get(key)) {
            Value::Map(mut map) => {
                let popped = map.pop().map(|(_, v)| v);
                (Value::Map(map), popped)
            }
            other => {
                let mut items = other.into_list();
                let popped = items.pop();
                (Value::List(items), popped)
            }
        };
        self.set(key, updated);
        popped.unwrap_or_default()
    }

    /// Prepends `values`, keeping their order.
    pub fn unshift(&self, key: &str, values: impl IntoIterator<Item = Value>) -> &Self {
        let updated = match collection(self.get(key)) {
            Value::Map(map) => {
                let mut front: Map = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect();
                front.extend(renumber(map, front.len()));
                Value::Map(front)
            }
            other => {
                let mut items: Vec<Value> = values.into_iter().collect();
                items.extend(other.into_list());
                Value::List(items)
            }
        };
        self.set(key, updated)
    }

    /// Removes and returns the first element; `Null` when empty.
    pub fn shift(&self, key: &str) -> Value {
        let (updated, shifted) = match collection(self.get(key)) {
            Value::Map(mut map) => {
                let shifted = map.shift_remove_index(0).map(|(_, v)| v);
                (Value::Map(renumber(map, 0)), shifted)
            }
            other => {
                let mut items = other.into_list();
                let shifted = (!items.is_empty()).then(|| items.remove(0));
                (Value::List(items), shifted)
            }
        };
        self.set(key, updated);
        shifted.unwrap_or_default()
    }
}

/// Null becomes an empty list, other non-collections a one-element list.
fn collection(value: Value) -> Value {
    match value {
        Value::Null => Value::List(Vec::new()),
        Value::List(_) | Value::Map(_) => value,
        other => Value::List(vec![other]),
    }
}

fn into_map(value: Value) -> Map {
    match collection(value) {
        Value::Map(map) => map,
        other => other
            .into_list()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
    }
}

fn next_index(map: &Map) -> usize {
    map.keys()
        .filter_map(|k| index_key(k))
        .max()
        .map_or(0, |max| max + 1)
}

/// Renumbers integer keys from `start`, keeping string keys and order.
fn renumber(map: Map, start: usize) -> Map {
    let mut next = start;
    map.into_iter()
        .map(|(k, v)| {
            if index_key(&k).is_some() {
                let key = next.to_string();
                next += 1;
                (key, v)
            } else {
                (k, v)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Entity, GetterOnly};
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn map(entries: &[(&str, Value)]) -> Map {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[rstest]
    #[case("foo")]
    #[case("foo.bar")]
    #[case("foo.bar.baz.qux")]
    fn set_get_has(#[case] key: &str) {
        let kernel = Kernel::new();
        assert!(!kernel.has(key));
        kernel.set(key, "value");
        assert!(kernel.has(key));
        assert_eq!(kernel.get(key), Value::from("value"));
    }

    #[test]
    fn null_values_still_count_as_present() {
        let kernel = Kernel::new();
        kernel.set("foo", Value::Null);
        assert!(kernel.has("foo"));
    }

    #[test]
    fn getter_values_count_as_present() {
        let kernel = Kernel::new();
        kernel.set("obj", Value::object(GetterOnly));

        assert_eq!(kernel.get("obj.foo"), Value::from("v"));
        assert!(kernel.has("obj.foo"));
        assert!(!kernel.has("obj.bar"));
    }

    #[test]
    fn remove_nested_leaf() {
        let kernel = Kernel::new();
        kernel.set("arr.foo", "bar").set("arr.bar", true).remove("arr.foo");
        assert_eq!(kernel.get("arr"), Value::from(map(&[("bar", Value::from(true))])));
    }

    #[test]
    fn writes_land_inside_context_objects() {
        let kernel = Kernel::new();
        let ent = Value::object(Entity::default());
        kernel.set("ent", ent.clone()).set("ent.foo", "bar");

        assert_eq!(ent.downcast_ref::<Entity>().unwrap().foo(), &Value::from("bar"));
        kernel.remove("ent.foo");
        assert!(!kernel.has("ent.foo"));
    }

    #[test]
    fn resolve_exposes_the_location() {
        let kernel = Kernel::new();
        kernel.set("counter", 1);
        kernel.resolve("counter", false, |loc| {
            assert!(loc.found);
            *loc.value = Value::from(loc.value.as_int().unwrap_or(0) + 1);
        });
        assert_eq!(kernel.get("counter"), Value::from(2));
    }

    #[test]
    fn bulk_operations() {
        let kernel = Kernel::new();
        kernel.all_set(map(&[("foo", Value::from(1)), ("bar", Value::from(2))]), Some("pre."));

        assert_eq!(kernel.get("pre.foo"), Value::from(1));
        assert!(kernel.all_has(["nope", "pre.bar"]));
        assert!(!kernel.all_has(["nope", "pre.baz"]));

        let got = kernel.all_get([KeyAlias::from(("f", "pre.foo")), KeyAlias::from("pre.bar")]);
        assert_eq!(got, map(&[("f", Value::from(1)), ("pre.bar", Value::from(2))]));

        kernel.all_remove(["pre.foo", "pre.bar"]);
        assert_eq!(kernel.get("pre"), Value::from(Map::new()));
    }

    #[test]
    fn prefix_is_concatenated_as_is() {
        let kernel = Kernel::new();
        kernel.all_set(map(&[("bar", Value::from("baz"))]), Some("foo_"));

        assert_eq!(kernel.get("foo_bar"), Value::from("baz"));
        assert!(!kernel.has("foo_"));
    }

    #[test]
    fn array_helpers_on_a_map() {
        let kernel = Kernel::new();
        kernel
            .merge("foo", map(&[("foo", Value::from("bar"))]))
            .push("foo", [Value::from("baz")])
            .unshift("foo", [Value::from("qux")]);

        assert_eq!(
            kernel.get("foo"),
            Value::from(map(&[
                ("0", Value::from("qux")),
                ("foo", Value::from("bar")),
                ("1", Value::from("baz")),
            ]))
        );
        assert_eq!(kernel.pop("foo"), Value::from("baz"));
        assert_eq!(kernel.shift("foo"), Value::from("qux"));
        assert_eq!(kernel.get("foo"), Value::from(map(&[("foo", Value::from("bar"))])));
    }

    #[test]
    fn array_helpers_on_missing_keys() {
        let kernel = Kernel::new();
        assert!(kernel.pop("popped").is_null());
        assert!(kernel.shift("shifted").is_null());
        assert_eq!(kernel.get("popped"), Value::List(vec![]));

        kernel.push("list", [Value::from(1), Value::from(2)]).unshift("list", [Value::from(0)]);
        assert_eq!(kernel.get("list"), Value::from(vec![Value::from(0), Value::from(1), Value::from(2)]));
    }

    #[test]
    fn scalars_are_wrapped_before_pushing() {
        let kernel = Kernel::new();
        kernel.set("one", "a").push("one", [Value::from("b")]);
        assert_eq!(kernel.get("one"), Value::from(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn merge_appends_integer_keys() {
        let kernel = Kernel::new();
        kernel.set("m", vec![Value::from("x")]);
        kernel.merge("m", map(&[("0", Value::from("y")), ("k", Value::from("v"))]));
        assert_eq!(
            kernel.get("m"),
            Value::from(map(&[("0", Value::from("x")), ("1", Value::from("y")), ("k", Value::from("v"))]))
        );
    }

    #[test]
    fn integer_keys_are_renumbered_from_zero() {
        let kernel = Kernel::new();
        kernel.set("m", map(&[("5", Value::from("a"))]));
        kernel.merge("m", map(&[("0", Value::from("b"))]));
        assert_eq!(
            kernel.get("m"),
            Value::from(map(&[("0", Value::from("a")), ("1", Value::from("b"))]))
        );

        kernel.set("p", map(&[("5", Value::from("a")), ("k", Value::from("v"))]));
        kernel.push("p", [Value::from("b")]);
        assert_eq!(
            kernel.get("p"),
            Value::from(map(&[("0", Value::from("a")), ("k", Value::from("v")), ("1", Value::from("b"))]))
        );
    }

    #[test]
    fn hooks_fire_with_remaining_segments() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let (on_set, on_remove, on_prepare) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let kernel = Kernel::builder()
            .on_context_set("db", move |kernel, rest, value| {
                // the write is visible to the hook
                assert_eq!(&kernel.get("db.host"), value);
                on_set.borrow_mut().push(format!("set {}", rest.join(".")));
            })
            .on_context_remove("db", move |_, rest| {
                on_remove.borrow_mut().push(format!("remove {}", rest.join(".")));
            })
            .on_context_prepare("db", move |_, rest| {
                on_prepare.borrow_mut().push(format!("prepare {}", rest.join(".")));
            })
            .build();

        kernel.set("db.host", "localhost");
        kernel.remove("db.host");
        kernel.get("other");

        assert_eq!(
            *log.borrow(),
            vec!["prepare host", "prepare host", "set host", "prepare host", "remove host"]
        );
    }
}
