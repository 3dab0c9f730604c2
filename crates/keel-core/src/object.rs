//! Object protocol.
//!
//! Objects opt into dotted-path access by exposing one (or more) member
//! conventions. Each probe returns `None` when the object does not follow
//! that convention; the path resolver walks them in a fixed order (see
//! [`crate::path::strategy`]).

use std::any::Any;
use std::fmt;

use crate::value::{Map, Value};

/// Blanket downcasting support for [`Object`] implementors.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value with identity that can live in the context or the container.
pub trait Object: AsAny + fmt::Debug + 'static {
    /// Class name used for bindings, type matching and default event names.
    fn class(&self) -> &str;

    /// Instance-of check. Override to declare implemented interfaces.
    fn is_a(&self, class: &str) -> bool {
        self.class() == class
    }

    /// Named accessors (`get_<field>` / `is_<field>`, `has_<field>`, `remove_<field>`).
    fn fields(&mut self) -> Option<&mut dyn Members> {
        None
    }

    /// Generic keyed bag (`get(key)`, `has(key)`, `remove(key)`).
    fn keyed(&mut self) -> Option<&mut dyn Members> {
        None
    }

    /// Offset access, like an indexable collection.
    fn offsets(&mut self) -> Option<&mut dyn Members> {
        None
    }

    /// Catch-all property hooks.
    fn magic(&mut self) -> Option<&mut dyn Members> {
        None
    }

    /// Dynamic properties stored directly on the object.
    fn properties(&mut self) -> Option<&mut Map> {
        None
    }
}

/// A member handed out by an object.
#[derive(Debug)]
pub enum Member<'a> {
    /// Writable slot inside the object; writes through it stick.
    Ref(&'a mut Value),
    /// Detached copy; writes through it are lost.
    Copy(Value),
}

impl Member<'_> {
    pub fn into_value(self) -> Value {
        match self {
            Member::Ref(slot) => slot.clone(),
            Member::Copy(value) => value,
        }
    }
}

/// One member-access convention of an object.
pub trait Members {
    /// Whether this convention has an accessor for `key`.
    ///
    /// Generic conventions accept every key; named accessors only the
    /// fields they declare.
    fn exposes(&self, _key: &str) -> bool {
        true
    }

    /// Existence check; `None` when the convention has none.
    fn has(&self, _key: &str) -> Option<bool> {
        None
    }

    fn get(&mut self, key: &str) -> Member<'_>;

    /// Returns `false` when the convention cannot store `key`.
    fn set(&mut self, _key: &str, _value: Value) -> bool {
        false
    }

    /// Returns `false` when the convention has no remover for `key`.
    fn remove(&mut self, _key: &str) -> bool {
        false
    }
}
