//! Object fixtures shared by unit tests, one per member convention.

use crate::object::{Member, Members, Object};
use crate::value::{Map, Value};

/// Named accessors for a single `foo` field, handing out references.
#[derive(Debug, Default)]
pub struct Entity {
    foo: Value,
}

impl Entity {
    pub fn foo(&self) -> &Value {
        &self.foo
    }

    pub fn set_foo(&mut self, value: Value) -> &mut Self {
        self.foo = value;
        self
    }
}

impl Members for Entity {
    fn exposes(&self, key: &str) -> bool {
        key == "foo"
    }

    fn has(&self, key: &str) -> Option<bool> {
        (key == "foo").then(|| !self.foo.is_null())
    }

    fn get(&mut self, key: &str) -> Member<'_> {
        match key {
            "foo" => Member::Ref(&mut self.foo),
            _ => Member::Copy(Value::Null),
        }
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        if key != "foo" {
            return false;
        }
        self.foo = value;
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        if key != "foo" {
            return false;
        }
        self.foo = Value::Null;
        true
    }
}

impl Object for Entity {
    fn class(&self) -> &str {
        "Entity"
    }

    fn fields(&mut self) -> Option<&mut dyn Members> {
        Some(self)
    }
}

/// Generic keyed bag whose getter returns copies.
#[derive(Debug, Default)]
pub struct Bag {
    data: Map,
}

impl Bag {
    pub fn insert(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }
}

impl Members for Bag {
    fn has(&self, key: &str) -> Option<bool> {
        Some(self.data.get(key).is_some_and(|v| !v.is_null()))
    }

    fn get(&mut self, key: &str) -> Member<'_> {
        Member::Copy(self.data.get(key).cloned().unwrap_or_default())
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        self.insert(key, value);
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        self.data.shift_remove(key);
        true
    }
}

impl Object for Bag {
    fn class(&self) -> &str {
        "Bag"
    }

    fn keyed(&mut self) -> Option<&mut dyn Members> {
        Some(self)
    }
}

/// Keyed getter with no existence check.
#[derive(Debug, Default)]
pub struct GetterOnly;

impl Members for GetterOnly {
    fn get(&mut self, key: &str) -> Member<'_> {
        match key {
            "foo" => Member::Copy(Value::from("v")),
            _ => Member::Copy(Value::Null),
        }
    }
}

impl Object for GetterOnly {
    fn class(&self) -> &str {
        "GetterOnly"
    }

    fn keyed(&mut self) -> Option<&mut dyn Members> {
        Some(self)
    }
}

/// Offset access with auto-vivifying, reference-returning reads.
#[derive(Debug, Default)]
pub struct OffsetArr {
    data: Map,
}

impl Members for OffsetArr {
    fn has(&self, key: &str) -> Option<bool> {
        Some(self.data.get(key).is_some_and(|v| !v.is_null()))
    }

    fn get(&mut self, key: &str) -> Member<'_> {
        Member::Ref(self.data.entry(key.to_string()).or_default())
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        self.data.insert(key.to_string(), value);
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        self.data.shift_remove(key);
        true
    }
}

impl Object for OffsetArr {
    fn class(&self) -> &str {
        "OffsetArr"
    }

    fn offsets(&mut self) -> Option<&mut dyn Members> {
        Some(self)
    }
}

/// Catch-all property hooks.
#[derive(Debug, Default)]
pub struct MagicObj {
    data: Map,
}

impl Members for MagicObj {
    fn has(&self, key: &str) -> Option<bool> {
        Some(self.data.get(key).is_some_and(|v| !v.is_null()))
    }

    fn get(&mut self, key: &str) -> Member<'_> {
        Member::Ref(self.data.entry(key.to_string()).or_default())
    }

    fn remove(&mut self, key: &str) -> bool {
        self.data.shift_remove(key);
        true
    }
}

impl Object for MagicObj {
    fn class(&self) -> &str {
        "MagicObj"
    }

    fn magic(&mut self) -> Option<&mut dyn Members> {
        Some(self)
    }
}

/// Object with nothing but dynamic properties.
#[derive(Debug, Default)]
pub struct Plain {
    pub props: Map,
}

impl Object for Plain {
    fn class(&self) -> &str {
        "Plain"
    }

    fn properties(&mut self) -> Option<&mut Map> {
        Some(&mut self.props)
    }
}
