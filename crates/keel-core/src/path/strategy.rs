//! Member-access strategies for objects met during path traversal.
//!
//! The table is consulted in order; the first strategy that supports a
//! segment handles the get and the existence check for it. Removal walks
//! the same order and stops at the first strategy that handles the key.

use crate::object::{Member, Members, Object};
use crate::value::Value;

pub trait AccessStrategy: Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, obj: &mut dyn Object, key: &str) -> bool;

    fn try_has(&self, obj: &mut dyn Object, key: &str) -> Option<bool>;

    /// `create` asks the strategy to materialise a missing slot when it can.
    fn try_get<'a>(&self, obj: &'a mut dyn Object, key: &str, create: bool) -> Option<Member<'a>>;

    fn try_set(&self, obj: &mut dyn Object, key: &str, value: Value) -> bool;

    fn try_remove(&self, obj: &mut dyn Object, key: &str) -> bool;
}

type Probe = fn(&mut dyn Object) -> Option<&mut dyn Members>;

/// A strategy backed by one of the [`Members`] probes on [`Object`].
pub struct Convention {
    name: &'static str,
    probe: Probe,
}

impl AccessStrategy for Convention {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, obj: &mut dyn Object, key: &str) -> bool {
        (self.probe)(obj).is_some_and(|members| members.exposes(key))
    }

    fn try_has(&self, obj: &mut dyn Object, key: &str) -> Option<bool> {
        (self.probe)(obj)?.has(key)
    }

    fn try_get<'a>(&self, obj: &'a mut dyn Object, key: &str, _create: bool) -> Option<Member<'a>> {
        Some((self.probe)(obj)?.get(key))
    }

    fn try_set(&self, obj: &mut dyn Object, key: &str, value: Value) -> bool {
        (self.probe)(obj).is_some_and(|members| members.set(key, value))
    }

    fn try_remove(&self, obj: &mut dyn Object, key: &str) -> bool {
        (self.probe)(obj).is_some_and(|members| members.remove(key))
    }
}

/// Dynamic properties: reads and writes land directly in the property map.
pub struct Properties;

impl AccessStrategy for Properties {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn supports(&self, obj: &mut dyn Object, _key: &str) -> bool {
        obj.properties().is_some()
    }

    fn try_has(&self, obj: &mut dyn Object, key: &str) -> Option<bool> {
        obj.properties().map(|props| props.contains_key(key))
    }

    fn try_get<'a>(&self, obj: &'a mut dyn Object, key: &str, create: bool) -> Option<Member<'a>> {
        let props = obj.properties()?;
        if create && !props.contains_key(key) {
            props.insert(key.to_string(), Value::Null);
        }
        match props.get_mut(key) {
            Some(slot) => Some(Member::Ref(slot)),
            None => Some(Member::Copy(Value::Null)),
        }
    }

    fn try_set(&self, obj: &mut dyn Object, key: &str, value: Value) -> bool {
        match obj.properties() {
            Some(props) => {
                props.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn try_remove(&self, obj: &mut dyn Object, key: &str) -> bool {
        obj.properties()
            .is_some_and(|props| props.shift_remove(key).is_some())
    }
}

fn probe_fields(obj: &mut dyn Object) -> Option<&mut dyn Members> {
    obj.fields()
}

fn probe_keyed(obj: &mut dyn Object) -> Option<&mut dyn Members> {
    obj.keyed()
}

fn probe_offsets(obj: &mut dyn Object) -> Option<&mut dyn Members> {
    obj.offsets()
}

fn probe_magic(obj: &mut dyn Object) -> Option<&mut dyn Members> {
    obj.magic()
}

static FIELDS: Convention = Convention { name: "fields", probe: probe_fields };
static KEYED: Convention = Convention { name: "keyed", probe: probe_keyed };
static OFFSETS: Convention = Convention { name: "offsets", probe: probe_offsets };
static MAGIC: Convention = Convention { name: "magic", probe: probe_magic };
static PROPERTIES: Properties = Properties;

/// Access strategies in priority order.
pub static STRATEGIES: [&dyn AccessStrategy; 5] = [&FIELDS, &KEYED, &OFFSETS, &MAGIC, &PROPERTIES];

/// Pick the first supporting strategy for `key` and hand out the member
/// together with its `found` flag.
pub(crate) fn access<'a>(obj: &'a mut dyn Object, key: &str, create: bool) -> Option<(bool, Member<'a>)> {
    let strategy = STRATEGIES.iter().find(|s| s.supports(&mut *obj, key))?;
    let found = strategy.try_has(&mut *obj, key).unwrap_or(false);
    tracing::trace!(strategy = strategy.name(), key, found, "object member");
    strategy.try_get(obj, key, create).map(|member| (found, member))
}

/// Remove `key` through the first strategy that handles it.
pub(crate) fn remove(obj: &mut dyn Object, key: &str) -> bool {
    STRATEGIES.iter().any(|s| s.try_remove(&mut *obj, key))
}
