//! Container - service bindings, singletons and calls
//!
//! Bindings map a name to a factory [`Callable`]; `make` invokes it through
//! [`Kernel::call`], so factories get their arguments bound like any other
//! function. Classes and free functions are registered explicitly and are
//! what call expressions resolve against.

pub mod binder;
pub mod class;
pub mod expr;
pub mod signature;

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::value::Value;

use binder::Resolver;
use class::Class;
use expr::CallExpr;
use signature::{Callable, Function, Param};

/// What a name is bound to.
#[derive(Debug, Clone)]
pub enum Concrete {
    /// The class registered under the bound name itself.
    Itself,
    /// A live value, stored straight into the instance cache.
    Instance(Value),
    Factory(Callable),
    /// Another registered class.
    Class(String),
}

impl Concrete {
    pub fn class(name: impl Into<String>) -> Self {
        Concrete::Class(name.into())
    }
}

impl From<Function> for Concrete {
    fn from(function: Function) -> Self {
        Concrete::Factory(function.into())
    }
}

impl From<Rc<Function>> for Concrete {
    fn from(function: Rc<Function>) -> Self {
        Concrete::Factory(function.into())
    }
}

impl From<Callable> for Concrete {
    fn from(callable: Callable) -> Self {
        Concrete::Factory(callable)
    }
}

impl From<Value> for Concrete {
    fn from(value: Value) -> Self {
        Concrete::Instance(value)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    factory: Callable,
    singleton: bool,
}

/// Registries behind the kernel's container operations.
#[derive(Debug, Default)]
pub struct Container {
    bindings: RefCell<IndexMap<String, Binding>>,
    instances: RefCell<IndexMap<String, Value>>,
    classes: RefCell<IndexMap<String, Rc<Class>>>,
    functions: RefCell<IndexMap<String, Rc<Function>>>,
}

impl Container {
    fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings.borrow().get(name).cloned()
    }

    fn instance(&self, name: &str) -> Option<Value> {
        self.instances.borrow().get(name).cloned()
    }

    fn class(&self, name: &str) -> Option<Rc<Class>> {
        self.classes.borrow().get(name).cloned()
    }

    fn function(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.borrow().get(name).cloned()
    }
}

impl Kernel {
    pub fn bind(&self, name: &str, concrete: impl Into<Concrete>, singleton: bool) -> &Self {
        let factory = match concrete.into() {
            Concrete::Instance(value) => return self.instance(name, value),
            Concrete::Factory(callable) => callable,
            Concrete::Itself => class_factory(name),
            Concrete::Class(class) => class_factory(&class),
        };
        debug!(service = name, singleton, "bind");
        self.container.instances.borrow_mut().shift_remove(name);
        self.container
            .bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { factory, singleton });
        self
    }

    pub fn singleton(&self, name: &str, concrete: impl Into<Concrete>) -> &Self {
        self.bind(name, concrete, true)
    }

    /// Registers a live value under `name`.
    pub fn instance(&self, name: &str, value: impl Into<Value>) -> &Self {
        debug!(service = name, "instance");
        self.container
            .instances
            .borrow_mut()
            .insert(name.to_string(), value.into());
        self
    }

    pub fn register_class(&self, class: Class) -> &Self {
        debug!(class = class.name(), kind = ?class.kind(), "register class");
        self.container
            .classes
            .borrow_mut()
            .insert(class.name().to_string(), Rc::new(class));
        self
    }

    pub fn register_function(&self, function: Function) -> &Self {
        self.container
            .functions
            .borrow_mut()
            .insert(function.name().to_string(), Rc::new(function));
        self
    }

    pub fn class(&self, name: &str) -> Option<Rc<Class>> {
        self.container.class(name)
    }

    /// Whether `make(name)` can succeed without arguments being checked.
    pub fn has_service(&self, name: &str) -> bool {
        self.container.instances.borrow().contains_key(name)
            || self.container.bindings.borrow().contains_key(name)
            || self.container.class(name).is_some_and(|c| c.is_instantiable())
    }

    /// Resolves `name` to a value.
    ///
    /// A cached instance is returned as is when no arguments are given.
    /// Otherwise the binding (or the registered class) is invoked and the
    /// result cached when the binding is a singleton.
    pub fn make(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        if args.is_empty() {
            if let Some(cached) = self.container.instance(name) {
                return Ok(cached);
            }
        }

        let binding = match self.container.binding(name) {
            Some(binding) => binding,
            None => Binding {
                factory: Callable::Function(self.constructor(name)?),
                singleton: false,
            },
        };

        debug!(service = name, singleton = binding.singleton, "make");
        let made = self.call(binding.factory, args)?;
        if binding.singleton {
            self.container
                .instances
                .borrow_mut()
                .insert(name.to_string(), made.clone());
        }
        Ok(made)
    }

    /// Binds `args` against the target's signature and invokes it.
    pub fn call(&self, target: impl Into<Callable>, args: Vec<Value>) -> Result<Value> {
        let function = match target.into() {
            Callable::Function(function) => function,
            Callable::Expr(expr) => self.call_ensure(&expr)?,
        };
        let args = binder::bind_arguments(function.signature(), args, self)?;
        function.invoke(self, args)
    }

    /// Resolves a call expression to a function without invoking it.
    ///
    /// `scope@member` constructs the receiver via `make(scope)`.
    pub fn call_ensure(&self, expr: &str) -> Result<Rc<Function>> {
        let invalid = || KernelError::InvalidCall(expr.to_string());
        match expr::parse(expr) {
            CallExpr::Function(name)
            | CallExpr::Static { scope: "", member: name }
            | CallExpr::Instance { scope: "", member: name } => self.container.function(name).ok_or_else(invalid),
            CallExpr::Static { scope, member } => self
                .container
                .class(scope)
                .and_then(|class| class.static_fn(member).cloned())
                .ok_or_else(invalid),
            CallExpr::Instance { scope, member } => {
                let receiver = self.make(scope, Vec::new())?;
                let object = receiver.as_object().ok_or_else(invalid)?;
                let class_name = object.borrow().class().to_string();
                let class = self
                    .container
                    .class(&class_name)
                    .or_else(|| self.container.class(scope))
                    .ok_or_else(invalid)?;
                let method = class.method_fn(member).ok_or_else(invalid)?;
                Ok(Rc::new(method.bind(&class_name, Rc::clone(object))))
            }
        }
    }

    /// Runs the constructor of a registered class.
    fn construct(&self, class: &str, args: Vec<Value>) -> Result<Value> {
        let constructor = self.constructor(class)?;
        debug!(class, "construct");
        self.call(constructor, args)
    }

    fn constructor(&self, class: &str) -> Result<Rc<Function>> {
        self.container
            .class(class)
            .filter(|c| c.is_instantiable())
            .and_then(|c| c.constructor_fn().cloned())
            .ok_or_else(|| KernelError::CannotInstantiate(class.to_string()))
    }
}

/// Factory that defers to the class registry at make time.
fn class_factory(class: &str) -> Callable {
    let target = class.to_string();
    Function::new(format!("{class}::construct"), [Param::variadic("args")], move |kernel, args| {
        kernel.construct(&target, args)
    })
    .into()
}

impl Resolver for Kernel {
    fn can_make(&self, class: &str) -> bool {
        self.has_service(class)
    }

    fn make_default(&self, class: &str) -> Result<Value> {
        self.make(class, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::signature::TypeHint;
    use crate::testing::Entity;
    use rstest::rstest;

    fn greeter() -> Class {
        Class::of::<Entity>("Entity")
            .method::<Entity, _>("greet", [Param::typed("name", TypeHint::Str)], |_, this, args| {
                let prefix = this.foo().as_str().unwrap_or("hello").to_string();
                Ok(Value::from(format!("{prefix} {}", args[0].as_str().unwrap_or_default())))
            })
            .static_method("shout", [Param::typed("text", TypeHint::Str)], |_, args| {
                Ok(Value::from(args[0].as_str().unwrap_or_default().to_uppercase()))
            })
    }

    fn kernel() -> Kernel {
        let kernel = Kernel::new();
        kernel.register_class(greeter());
        kernel
    }

    #[rstest]
    #[case::plain(false)]
    #[case::singleton(true)]
    fn bindings_share_instances_only_when_singleton(#[case] singleton: bool) {
        let kernel = kernel();
        let factory = Function::new("make_entity", [], |_, _| Ok(Value::object(Entity::default())));
        kernel.bind("ent", factory, singleton);

        let a = kernel.make("ent", vec![]).unwrap();
        let b = kernel.make("ent", vec![]).unwrap();
        assert_eq!(a.same(&b), singleton);
    }

    #[test]
    fn rebinding_drops_cached_instance() {
        let kernel = kernel();
        kernel.singleton("ent", Concrete::Itself);
        kernel.singleton("ent", Concrete::class("Entity"));
        let first = kernel.make("ent", vec![]).unwrap();
        assert_eq!(first.class().as_deref(), Some("Entity"));

        kernel.singleton("ent", Function::new("other", [], |_, _| Ok(Value::from(1))));
        assert_eq!(kernel.make("ent", vec![]).unwrap(), Value::from(1));
    }

    #[test]
    fn instance_is_returned_as_is() {
        let kernel = kernel();
        let live = Value::object(Entity::default());
        kernel.instance("live", live.clone());
        assert!(kernel.make("live", vec![]).unwrap().same(&live));
        assert!(kernel.has_service("live"));
    }

    #[test]
    fn registered_class_makes_implicitly() {
        let kernel = kernel();
        let made = kernel.make("Entity", vec![]).unwrap();
        assert_eq!(made.class().as_deref(), Some("Entity"));
    }

    #[rstest]
    #[case::unknown(Class::new("Missing"), "Nope")]
    #[case::abstract_class(Class::abstract_class("Base"), "Base")]
    #[case::interface(Class::interface("Contract"), "Contract")]
    #[case::no_constructor(Class::new("Bare"), "Bare")]
    fn cannot_instantiate(#[case] class: Class, #[case] name: &str) {
        let kernel = kernel();
        kernel.register_class(class);
        let err = kernel.make(name, vec![]).unwrap_err();
        assert_eq!(err.to_string(), format!("Cannot instantiate: {name}"));
    }

    #[test]
    fn make_passes_arguments_to_constructor() {
        let kernel = kernel();
        kernel.register_class(Class::new("Pair").constructor(
            [Param::typed("a", TypeHint::Int), Param::typed("b", TypeHint::Int).with_default(10)],
            |_, args| Ok(Value::from(args)),
        ));
        kernel.bind("pair", Concrete::class("Pair"), false);

        let made = kernel.make("pair", vec![Value::from(1)]).unwrap();
        assert_eq!(made, Value::from(vec![Value::from(1), Value::from(10)]));
    }

    #[test]
    fn call_binds_and_checks_arity() {
        let kernel = kernel();
        let sum = Function::new(
            "sum",
            [Param::typed("a", TypeHint::Int), Param::typed("b", TypeHint::Int)],
            |_, args| Ok(Value::from(args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0))),
        );
        assert_eq!(kernel.call(sum.clone(), vec![Value::from(2), Value::from(3)]).unwrap(), Value::from(5));

        let err = kernel.call(sum, vec![]).unwrap_err();
        assert!(err.to_string().starts_with("Too few arguments to function sum()"));
    }

    #[test]
    fn call_expressions_reach_functions_statics_and_methods() {
        let kernel = kernel();
        kernel.register_function(Function::new("double", [Param::typed("n", TypeHint::Int)], |_, args| {
            Ok(Value::from(args[0].as_int().unwrap_or(0) * 2))
        }));

        assert_eq!(kernel.call("double", vec![Value::from(4)]).unwrap(), Value::from(8));
        assert_eq!(kernel.call(":double", vec![Value::from(1)]).unwrap(), Value::from(2));
        assert_eq!(kernel.call("Entity:shout", vec![Value::from("hi")]).unwrap(), Value::from("HI"));
        assert_eq!(kernel.call("Entity@greet", vec![Value::from("bob")]).unwrap(), Value::from("hello bob"));
    }

    #[test]
    fn instance_call_uses_bound_receiver() {
        let kernel = kernel();
        let ent = Value::object(Entity::default());
        ent.downcast_mut::<Entity>().unwrap().set_foo(Value::from("hey"));
        kernel.instance("greeter", ent);

        assert_eq!(kernel.call("greeter@greet", vec![Value::from("you")]).unwrap(), Value::from("hey you"));
    }

    #[rstest]
    #[case::unknown_function("nope")]
    #[case::unknown_static("Entity:xyz")]
    #[case::unknown_method("Entity@xyz")]
    #[case::own_table("@xyz")]
    fn invalid_calls(#[case] expr: &str) {
        let err = kernel().call_ensure(expr).unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid call: {expr}"));
    }

    #[test]
    fn instance_call_on_unknown_scope_cannot_instantiate() {
        let err = kernel().call_ensure("Ghost@run").unwrap_err();
        assert!(matches!(err, KernelError::CannotInstantiate(ref name) if name == "Ghost"));
    }

    #[test]
    fn class_typed_parameter_is_constructed() {
        let kernel = kernel();
        let describe = Function::new("describe", [Param::class("entity", "Entity")], |_, args| {
            Ok(Value::from(args[0].class().unwrap_or_default()))
        });
        assert_eq!(kernel.call(describe, vec![]).unwrap(), Value::from("Entity"));
    }
}
