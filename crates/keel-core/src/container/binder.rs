//! Argument binding - 宣言されたパラメータに引数を割り当てる
//!
//! # 割り当て順序（パラメータごと）
//! 1. variadic: 残りの引数をすべて受け取る
//! 2. 型付き: 型が一致する最初の引数を取り出す（左から右へ一度だけ走査）
//! 3. 型付き + default: default を使う
//! 4. 型付き + 構築可能な class 型: `make(class)` で生成する
//! 5. 残りの引数があれば先頭を位置引数として使う
//! 6. 型なし + default: default を使う
//! 7. nullable: `Null`
//! 8. それ以外: 割り当てを打ち切る
//!
//! 余った引数は末尾に追加される。引数の数のチェックは呼び出し側
//! ([`Function::invoke`](super::Function::invoke)) が行う。

use crate::error::Result;
use crate::value::Value;

use super::signature::Signature;

/// Builds missing class-typed arguments.
pub trait Resolver {
    fn can_make(&self, class: &str) -> bool;

    fn make_default(&self, class: &str) -> Result<Value>;
}

pub fn bind_arguments(signature: &Signature, supplied: Vec<Value>, resolver: &dyn Resolver) -> Result<Vec<Value>> {
    let mut pool = supplied;
    let mut bound = Vec::with_capacity(signature.params().len().max(pool.len()));

    for param in signature.params() {
        if param.is_variadic() {
            bound.append(&mut pool);
            break;
        }

        if param.is_typed() {
            if let Some(index) = pool.iter().position(|arg| param.accepts(arg)) {
                bound.push(pool.remove(index));
                continue;
            }
            if let Some(default) = param.default_value() {
                bound.push(default.clone());
                continue;
            }
            if let Some(class) = param.class_types().find(|class| resolver.can_make(class)) {
                tracing::debug!(param = param.name(), class, "constructing argument");
                bound.push(resolver.make_default(class)?);
                continue;
            }
        }

        if !pool.is_empty() {
            bound.push(pool.remove(0));
        } else if let Some(default) = param.default_value() {
            bound.push(default.clone());
        } else if param.is_nullable() {
            bound.push(Value::Null);
        } else {
            break;
        }
    }

    bound.append(&mut pool);
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::signature::{Param, TypeHint};
    use crate::testing::{Bag, Entity};
    use rstest::rstest;

    /// Knows how to build `Entity` and nothing else.
    struct Stub;

    impl Resolver for Stub {
        fn can_make(&self, class: &str) -> bool {
            class == "Entity"
        }

        fn make_default(&self, _class: &str) -> Result<Value> {
            Ok(Value::object(Entity::default()))
        }
    }

    fn bind(params: Vec<Param>, args: Vec<Value>) -> Vec<Value> {
        bind_arguments(&Signature::new(params), args, &Stub).unwrap()
    }

    fn int_str_rest() -> Vec<Param> {
        vec![
            Param::typed("a", TypeHint::Int),
            Param::typed("b", TypeHint::Str).nullable(),
            Param::variadic("rest"),
        ]
    }

    #[rstest]
    #[case::fills_nullable(vec![Value::from(1)], vec![Value::from(1), Value::Null])]
    #[case::exact(
        vec![Value::from(1), Value::from("foo"), Value::from("bar")],
        vec![Value::from(1), Value::from("foo"), Value::from("bar")]
    )]
    #[case::reordered_by_type(
        vec![Value::from("foo"), Value::from(1)],
        vec![Value::from(1), Value::from("foo")]
    )]
    fn typed_and_variadic(#[case] args: Vec<Value>, #[case] expected: Vec<Value>) {
        assert_eq!(bind(int_str_rest(), args), expected);
    }

    #[test]
    fn nothing_bound_when_required_typed_param_has_no_match() {
        let params = vec![Param::typed("a", TypeHint::Int), Param::typed("b", TypeHint::Int)];
        assert!(bind(params, vec![]).is_empty());
    }

    #[test]
    fn mismatched_type_falls_back_to_next_positional() {
        let params = vec![Param::typed("a", TypeHint::Int)];
        assert_eq!(bind(params, vec![Value::from("x")]), vec![Value::from("x")]);
    }

    #[test]
    fn typed_default_wins_over_positional() {
        let params = vec![Param::typed("a", TypeHint::Int).with_default(7)];
        assert_eq!(bind(params, vec![Value::from("x")]), vec![Value::from(7), Value::from("x")]);
    }

    #[test]
    fn untyped_default_used_when_pool_empty() {
        let params = vec![Param::new("a"), Param::new("b").with_default("d")];
        assert_eq!(bind(params, vec![Value::from(1)]), vec![Value::from(1), Value::from("d")]);
    }

    #[test]
    fn constructible_class_is_made() {
        let params = vec![Param::class("entity", "Entity"), Param::typed("n", TypeHint::Int)];
        let bound = bind(params, vec![Value::from(3)]);
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].class().as_deref(), Some("Entity"));
        assert_eq!(bound[1], Value::from(3));
    }

    #[test]
    fn supplied_object_preferred_over_construction() {
        let given = Value::object(Entity::default());
        let params = vec![Param::class("entity", "Entity")];
        let bound = bind(params, vec![Value::from(1), given.clone()]);
        assert!(bound[0].same(&given));
        assert_eq!(bound[1], Value::from(1));
    }

    #[test]
    fn union_takes_first_argument_matching_any_member() {
        let params = vec![Param::typed("x", TypeHint::Str).or(TypeHint::Int)];
        let bound = bind(params, vec![Value::from(2), Value::from("s")]);
        assert_eq!(bound, vec![Value::from(2), Value::from("s")]);
    }

    #[test]
    fn unconstructible_class_without_args_stops() {
        let params = vec![Param::class("bag", "Bag"), Param::new("after")];
        assert!(bind(params, vec![]).is_empty());

        let bag = Value::object(Bag::default());
        let bound = bind(vec![Param::class("bag", "Bag")], vec![bag.clone()]);
        assert!(bound[0].same(&bag));
    }
}
