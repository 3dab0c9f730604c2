//! Event dispatch.
//!
//! Listeners are plain callables; each receives the event object as its
//! single supplied argument, so a listener declared with a class-typed
//! parameter (`Param::class("event", "Event")`) gets it bound by type.
//! Dispatch iterates a sorted snapshot: listeners added or removed while
//! a dispatch runs only affect later dispatches.

mod listeners;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::container::signature::Callable;
use crate::error::Result;
use crate::kernel::Kernel;
use crate::object::Object;
use crate::value::{Map, ObjectRef, Value};

pub use listeners::{DEFAULT_PRIORITY, Dispatcher, Listener};

/// An object that can be dispatched.
pub trait Dispatchable: Object {
    /// Name used when dispatch is not given one; falls back to the class.
    fn name(&self) -> Option<&str> {
        None
    }

    fn stop_propagation(&mut self);

    fn is_propagation_stopped(&self) -> bool;
}

/// General purpose event carrying dynamic properties.
#[derive(Debug, Default)]
pub struct Event {
    name: Option<String>,
    stopped: bool,
    props: Map,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Shared handle to pass to [`Kernel::dispatch`].
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Appends to the list stored under `key`.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let slot = self.props.entry(key.to_string()).or_default();
        let mut items = std::mem::take(slot).into_list();
        items.push(value.into());
        *slot = Value::List(items);
        self
    }

    pub fn props(&self) -> &Map {
        &self.props
    }
}

impl Object for Event {
    fn class(&self) -> &str {
        "Event"
    }

    fn properties(&mut self) -> Option<&mut Map> {
        Some(&mut self.props)
    }
}

impl Dispatchable for Event {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

impl Kernel {
    pub fn on(&self, name: &str, handler: impl Into<Callable>) -> &Self {
        self.listen(name, Listener::new(handler))
    }

    /// Listener removed after its first call.
    pub fn one(&self, name: &str, handler: impl Into<Callable>) -> &Self {
        self.listen(name, Listener::new(handler).once())
    }

    pub fn listen(&self, name: &str, listener: Listener) -> &Self {
        self.dispatcher.listen(name, listener);
        self
    }

    /// Removes the listener registered under `id`, or every listener of
    /// `name` when no id is given.
    pub fn off(&self, name: &str, id: Option<&str>) -> &Self {
        self.dispatcher.off(name, id);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Calls the listeners of `name` (or the event's own name, or its
    /// class) in priority order until one stops propagation.
    ///
    /// With `once` the listener table is dropped before the first call.
    /// Listener errors abort the dispatch and are returned as is.
    pub fn dispatch<E: Dispatchable>(&self, event: &Rc<RefCell<E>>, name: Option<&str>, once: bool) -> Result<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let event = event.borrow();
                event.name().unwrap_or_else(|| event.class()).to_string()
            }
        };

        let listeners = self.dispatcher.snapshot(&name);
        if once {
            self.dispatcher.forget(&name);
        }
        debug!(event = %name, listeners = listeners.len(), once, "dispatch");

        let handle: ObjectRef = event.clone();
        for entry in listeners.iter() {
            if event.borrow().is_propagation_stopped() {
                debug!(event = %name, "propagation stopped");
                break;
            }
            self.call(entry.handler.clone(), vec![Value::Object(Rc::clone(&handle))])?;
            if entry.once && !once {
                self.dispatcher.remove(&name, &entry.key);
            }
        }
        Ok(())
    }
}
