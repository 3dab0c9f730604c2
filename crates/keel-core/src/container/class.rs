//! Class registry entries.
//!
//! A [`Class`] describes how to construct a type and which methods can be
//! reached through call expressions. Nothing is discovered at runtime:
//! constructors, methods and their signatures are registered explicitly.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::object::Object;
use crate::value::{ObjectRef, Value};

use super::signature::{Function, Param, Signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

type MethodBody = dyn Fn(&Kernel, &ObjectRef, Vec<Value>) -> Result<Value>;

/// An instance method. Bound to a receiver before it is called.
#[derive(Clone)]
pub struct Method {
    name: String,
    signature: Signature,
    body: Rc<MethodBody>,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(&self, class: &str, receiver: ObjectRef) -> Function {
        let body = Rc::clone(&self.body);
        Function::new(
            format!("{class}::{}", self.name),
            self.signature.params().to_vec(),
            move |kernel, args| body(kernel, &receiver, args),
        )
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    kind: ClassKind,
    constructor: Option<Rc<Function>>,
    methods: IndexMap<String, Method>,
    statics: IndexMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Concrete,
            constructor: None,
            methods: IndexMap::new(),
            statics: IndexMap::new(),
        }
    }

    /// Concrete class built from `T::default()` with no parameters.
    pub fn of<T: Object + Default>(name: impl Into<String>) -> Self {
        Self::new(name).constructor([], |_, _| Ok(Value::object(T::default())))
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Abstract,
            ..Self::new(name)
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::new(name)
        }
    }

    pub fn constructor<F>(mut self, params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        F: Fn(&Kernel, Vec<Value>) -> Result<Value> + 'static,
    {
        let name = format!("{}::new", self.name);
        self.constructor = Some(Rc::new(Function::new(name, params, body)));
        self
    }

    /// Instance method with a typed receiver.
    ///
    /// The receiver stays mutably borrowed while `body` runs, so the body
    /// must not reach the same object through the kernel.
    pub fn method<T, F>(mut self, name: impl Into<String>, params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        T: Object,
        F: Fn(&Kernel, &mut T, Vec<Value>) -> Result<Value> + 'static,
    {
        let name = name.into();
        let function = format!("{}::{}", self.name, name);
        let expected = self.name.clone();
        let body = move |kernel: &Kernel, receiver: &ObjectRef, args: Vec<Value>| {
            let mut guard = receiver.borrow_mut();
            let this = (*guard)
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| KernelError::Argument {
                    function: function.clone(),
                    index: 0,
                    expected: expected.clone(),
                })?;
            body(kernel, this, args)
        };
        self.methods.insert(
            name.clone(),
            Method {
                name,
                signature: Signature::new(params),
                body: Rc::new(body),
            },
        );
        self
    }

    /// Instance method receiving the shared handle; no borrow is held.
    pub fn shared_method<F>(mut self, name: impl Into<String>, params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        F: Fn(&Kernel, &ObjectRef, Vec<Value>) -> Result<Value> + 'static,
    {
        let name = name.into();
        self.methods.insert(
            name.clone(),
            Method {
                name,
                signature: Signature::new(params),
                body: Rc::new(body),
            },
        );
        self
    }

    pub fn static_method<F>(mut self, name: impl Into<String>, params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        F: Fn(&Kernel, Vec<Value>) -> Result<Value> + 'static,
    {
        let name = name.into();
        let function = Function::new(format!("{}::{}", self.name, name), params, body);
        self.statics.insert(name, Rc::new(function));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Concrete and with a public constructor.
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete && self.constructor.is_some()
    }

    pub fn constructor_fn(&self) -> Option<&Rc<Function>> {
        self.constructor.as_ref()
    }

    pub fn method_fn(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn static_fn(&self, name: &str) -> Option<&Rc<Function>> {
        self.statics.get(name)
    }
}
