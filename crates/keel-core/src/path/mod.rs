//! Dotted-path resolution over the context.
//!
//! `foo.bar.baz` walks maps, lists and objects one segment at a time.
//! A literal dot inside a segment is written `\.`.
//!
//! Writes through a [`Location`] land in the context, with two exceptions:
//! a path that was not found without creation yields a detached `Null`, and
//! a walk that crossed an object member handed out by value
//! ([`Member::Copy`]) continues on a copy, so writes below it are lost.

pub mod strategy;

use crate::object::Member;
use crate::value::{Map, Value, index_key};

/// Terminal slot of a resolved path.
#[derive(Debug)]
pub struct Location<'a> {
    pub value: &'a mut Value,
    /// Whether the terminal slot existed before resolution.
    pub found: bool,
    pub parts: &'a [String],
}

/// Owned result of a read-only resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub value: Value,
    pub found: bool,
    pub parts: Vec<String>,
}

/// Split a key into path segments.
///
/// A key without any `.` is returned as is. Otherwise the key is split on
/// dots not preceded by a backslash, backslashes are removed from every
/// segment and empty segments are dropped.
pub fn parts(key: &str) -> Vec<String> {
    if !key.contains('.') {
        return vec![key.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in key.chars() {
        match ch {
            '.' if !escaped => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            '\\' => {
                escaped = true;
                continue;
            }
            other => current.push(other),
        }
        escaped = false;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Resolve `path` against `root` and hand the terminal location to `f`.
///
/// With `create_missing` absent map keys are inserted, `Null` and scalar
/// values on the way are replaced by empty maps, and objects are asked to
/// materialise missing members. Without it the walk stops at the first
/// absent segment.
pub fn resolve<R, F>(root: &mut Map, path: &str, create_missing: bool, f: F) -> R
where
    F: FnOnce(Location<'_>) -> R,
{
    let parts = parts(path);
    tracing::trace!(path, create_missing, "resolve");

    if let [key] = parts.as_slice() {
        let found = root.contains_key(key);
        if !found && !create_missing {
            return detached(&parts, f);
        }
        let slot = root.entry(key.clone()).or_insert(Value::Null);
        return f(Location { value: slot, found, parts: &parts });
    }

    let Some((first, rest)) = parts.split_first() else {
        return detached(&parts, f);
    };
    let found = root.contains_key(first);
    if !found && !create_missing {
        return detached(&parts, f);
    }
    let slot = root.entry(first.clone()).or_insert(Value::Null);
    descend(slot, rest, found, &parts, create_missing, f)
}

fn descend<R, F>(
    current: &mut Value,
    rest: &[String],
    found: bool,
    parts: &[String],
    create: bool,
    f: F,
) -> R
where
    F: FnOnce(Location<'_>) -> R,
{
    let Some((segment, rest)) = rest.split_first() else {
        return f(Location { value: current, found, parts });
    };

    if current.is_null() || current.is_scalar() {
        if !create {
            return detached(parts, f);
        }
        *current = Value::Map(Map::new());
    }

    match current {
        Value::Map(map) => {
            let found = map.contains_key(segment);
            if !found && !create {
                return detached(parts, f);
            }
            let slot = map.entry(segment.clone()).or_insert(Value::Null);
            descend(slot, rest, found, parts, create, f)
        }
        Value::List(items) => match index_key(segment) {
            Some(i) if i < items.len() => descend(&mut items[i], rest, true, parts, create, f),
            Some(i) if i == items.len() && create => {
                items.push(Value::Null);
                descend(&mut items[i], rest, false, parts, create, f)
            }
            _ => detached(parts, f),
        },
        Value::Object(obj) => {
            let mut guard = obj.borrow_mut();
            let out = match strategy::access(&mut *guard, segment, create) {
                Some((found, Member::Ref(slot))) => descend(slot, rest, found, parts, create, f),
                Some((found, Member::Copy(mut copy))) => {
                    descend(&mut copy, rest, found, parts, create, f)
                }
                None => detached(parts, f),
            };
            out
        }
        _ => detached(parts, f),
    }
}

fn detached<R, F>(parts: &[String], f: F) -> R
where
    F: FnOnce(Location<'_>) -> R,
{
    let mut value = Value::Null;
    f(Location { value: &mut value, found: false, parts })
}

/// Read-only resolution; never mutates plain data.
pub fn lookup(root: &Map, path: &str) -> Lookup {
    let parts = parts(path);
    let (value, found) = read(root, &parts);
    Lookup { value, found, parts }
}

fn read(root: &Map, parts: &[String]) -> (Value, bool) {
    let Some((first, rest)) = parts.split_first() else {
        return (Value::Null, false);
    };
    let Some(mut current) = root.get(first).cloned() else {
        return (Value::Null, false);
    };
    let mut found = true;

    for segment in rest {
        let next = match &current {
            Value::Map(map) => map.get(segment).cloned().map(|v| (v, true)),
            Value::List(items) => index_key(segment)
                .and_then(|i| items.get(i))
                .cloned()
                .map(|v| (v, true)),
            Value::Object(obj) => {
                let mut guard = obj.borrow_mut();
                strategy::access(&mut *guard, segment, false)
                    .map(|(found, member)| (member.into_value(), found))
            }
            _ => None,
        };
        match next {
            Some((value, hit)) => {
                current = value;
                found = hit;
            }
            None => return (Value::Null, false),
        }
    }

    (current, found)
}

/// Remove the slot addressed by `path`, returning the decomposed path.
pub fn remove(root: &mut Map, path: &str) -> Vec<String> {
    let parts = parts(path);

    let Some((leaf, parent)) = parts.split_last() else {
        return parts;
    };
    if parent.is_empty() {
        root.shift_remove(leaf);
        return parts;
    }

    let parent_path = parent
        .iter()
        .map(|p| p.replace('.', "\\."))
        .collect::<Vec<_>>()
        .join(".");

    resolve(root, &parent_path, false, |loc| match loc.value {
        Value::Map(map) => {
            map.shift_remove(leaf);
        }
        Value::List(items) => {
            if let Some(i) = index_key(leaf).filter(|i| *i < items.len()) {
                items.remove(i);
            }
        }
        Value::Object(obj) => {
            let mut guard = obj.borrow_mut();
            strategy::remove(&mut *guard, leaf);
        }
        _ => {}
    });

    parts
}
