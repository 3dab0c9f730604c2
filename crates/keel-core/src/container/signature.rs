//! Parameter descriptors and callable functions.
//!
//! A [`Function`] carries an explicit [`Signature`]; the container binds
//! supplied arguments against it before invoking the body.

use std::fmt;
use std::rc::Rc;

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::value::Value;

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    /// Any object.
    Object,
    /// Objects that report `is_a(name)`.
    Class(String),
}

impl TypeHint {
    pub fn class(name: impl Into<String>) -> Self {
        TypeHint::Class(name.into())
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeHint::Null, Value::Null)
            | (TypeHint::Bool, Value::Bool(_))
            | (TypeHint::Int, Value::Int(_))
            | (TypeHint::Float, Value::Float(_))
            | (TypeHint::Str, Value::Str(_))
            | (TypeHint::List, Value::List(_))
            | (TypeHint::Map, Value::Map(_))
            | (TypeHint::Object, Value::Object(_)) => true,
            (TypeHint::Class(name), Value::Object(obj)) => {
                obj.try_borrow().is_ok_and(|o| o.is_a(name))
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Null => f.write_str("null"),
            TypeHint::Bool => f.write_str("bool"),
            TypeHint::Int => f.write_str("int"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::Str => f.write_str("string"),
            TypeHint::List => f.write_str("list"),
            TypeHint::Map => f.write_str("map"),
            TypeHint::Object => f.write_str("object"),
            TypeHint::Class(name) => f.write_str(name),
        }
    }
}

/// One declared parameter.
///
/// ```ignore
/// Param::typed("id", TypeHint::Int).or(TypeHint::Str).nullable();
/// Param::class("event", "Event");
/// Param::variadic("rest");
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    types: Vec<TypeHint>,
    default: Option<Value>,
    variadic: bool,
    nullable: bool,
}

impl Param {
    /// Untyped parameter. Accepts anything, including an absent value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            default: None,
            variadic: false,
            nullable: false,
        }
    }

    pub fn typed(name: impl Into<String>, ty: TypeHint) -> Self {
        Self::new(name).or(ty)
    }

    pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::typed(name, TypeHint::Class(class.into()))
    }

    /// Collects every remaining argument.
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            variadic: true,
            ..Self::new(name)
        }
    }

    /// Adds a member to the union type.
    pub fn or(mut self, ty: TypeHint) -> Self {
        self.types.push(ty);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeHint] {
        &self.types
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn is_typed(&self) -> bool {
        !self.types.is_empty()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable || !self.is_typed() || self.types.contains(&TypeHint::Null)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.types.iter().any(|ty| ty.matches(value))
    }

    /// Class names in the union, in declaration order.
    pub fn class_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().filter_map(|ty| match ty {
            TypeHint::Class(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Ordered parameter list of a [`Function`].
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of leading arguments a call must supply.
    pub fn required(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| !p.is_variadic() && p.default_value().is_none())
            .map_or(0, |last| last + 1)
    }

    /// Whether the signature accepts more arguments than it requires.
    pub fn is_open_ended(&self) -> bool {
        self.required() < self.params.len()
    }

    pub(crate) fn check_arity(&self, function: &str, passed: usize) -> Result<()> {
        let expected = self.required();
        if passed < expected {
            return Err(KernelError::TooFewArguments {
                function: function.to_string(),
                passed,
                expected,
                open_ended: self.is_open_ended(),
            });
        }
        Ok(())
    }
}

type Body = dyn Fn(&Kernel, Vec<Value>) -> Result<Value>;

/// A named, invocable body with a declared signature.
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Signature,
    body: Rc<Body>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        F: Fn(&Kernel, Vec<Value>) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            signature: Signature::new(params),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Runs the body with already-bound arguments.
    pub fn invoke(&self, kernel: &Kernel, args: Vec<Value>) -> Result<Value> {
        self.signature.check_arity(&self.name, args.len())?;
        (self.body)(kernel, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Something `Kernel::call` can invoke.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<Function>),
    /// `name`, `scope:member` (static) or `scope@member` (instance).
    Expr(String),
}

impl From<Function> for Callable {
    fn from(function: Function) -> Self {
        Callable::Function(Rc::new(function))
    }
}

impl From<Rc<Function>> for Callable {
    fn from(function: Rc<Function>) -> Self {
        Callable::Function(function)
    }
}

impl From<&str> for Callable {
    fn from(expr: &str) -> Self {
        Callable::Expr(expr.to_string())
    }
}

impl From<String> for Callable {
    fn from(expr: String) -> Self {
        Callable::Expr(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Entity;
    use rstest::rstest;

    #[rstest]
    #[case::int(TypeHint::Int, Value::from(1), true)]
    #[case::int_vs_float(TypeHint::Int, Value::from(1.5), false)]
    #[case::str(TypeHint::Str, Value::from("x"), true)]
    #[case::null(TypeHint::Null, Value::Null, true)]
    #[case::object(TypeHint::Object, Value::object(Entity::default()), true)]
    #[case::class(TypeHint::class("Entity"), Value::object(Entity::default()), true)]
    #[case::other_class(TypeHint::class("Bag"), Value::object(Entity::default()), false)]
    #[case::class_vs_scalar(TypeHint::class("Entity"), Value::from("Entity"), false)]
    fn type_hints_match_runtime_kinds(#[case] hint: TypeHint, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(hint.matches(&value), expected);
    }

    #[rstest]
    #[case::empty(vec![], 0)]
    #[case::plain(vec![Param::new("a"), Param::new("b")], 2)]
    #[case::trailing_default(vec![Param::new("a"), Param::new("b").with_default(1)], 1)]
    #[case::default_before_required(vec![Param::new("a").with_default(1), Param::new("b")], 2)]
    #[case::variadic(vec![Param::new("a"), Param::variadic("rest")], 1)]
    fn required_counts_up_to_last_mandatory(#[case] params: Vec<Param>, #[case] expected: usize) {
        assert_eq!(Signature::new(params).required(), expected);
    }

    #[test]
    fn untyped_params_are_nullable() {
        assert!(Param::new("a").is_nullable());
        assert!(!Param::typed("a", TypeHint::Int).is_nullable());
        assert!(Param::typed("a", TypeHint::Int).nullable().is_nullable());
        assert!(Param::typed("a", TypeHint::Int).or(TypeHint::Null).is_nullable());
    }

    #[test]
    fn arity_check_reports_shape() {
        let sig = Signature::new([Param::typed("a", TypeHint::Int), Param::typed("b", TypeHint::Int)]);
        let err = sig.check_arity("sum", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too few arguments to function sum(), 1 passed and exactly 2 expected"
        );
        assert!(sig.check_arity("sum", 2).is_ok());
    }
}
