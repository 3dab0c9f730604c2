//! Call expressions: `name`, `scope:member`, `scope@member`.

use std::sync::LazyLock;

use regex::Regex;

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)([:@])([A-Za-z_][A-Za-z0-9_]*)$").expect("call expression pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallExpr<'a> {
    /// A registered free function.
    Function(&'a str),
    /// `scope:member`, a static method. Empty scope means the function table.
    Static { scope: &'a str, member: &'a str },
    /// `scope@member`, a method on `make(scope)`. Empty scope means the function table.
    Instance { scope: &'a str, member: &'a str },
}

pub fn parse(expr: &str) -> CallExpr<'_> {
    let Some(caps) = CALL.captures(expr) else {
        return CallExpr::Function(expr);
    };
    let scope = caps.get(1).map_or("", |m| m.as_str());
    let member = caps.get(3).map_or("", |m| m.as_str());
    match caps.get(2).map(|m| m.as_str()) {
        Some(":") => CallExpr::Static { scope, member },
        _ => CallExpr::Instance { scope, member },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::function("strtoupper", CallExpr::Function("strtoupper"))]
    #[case::static_call("Greeter:create", CallExpr::Static { scope: "Greeter", member: "create" })]
    #[case::instance_call("Greeter@greet", CallExpr::Instance { scope: "Greeter", member: "greet" })]
    #[case::namespaced("app::Greeter@greet", CallExpr::Instance { scope: "app::Greeter", member: "greet" })]
    #[case::own_table(":helper", CallExpr::Static { scope: "", member: "helper" })]
    #[case::own_table_instance("@helper", CallExpr::Instance { scope: "", member: "helper" })]
    #[case::bad_member("Greeter@", CallExpr::Function("Greeter@"))]
    fn parses(#[case] expr: &str, #[case] expected: CallExpr<'_>) {
        assert_eq!(parse(expr), expected);
    }
}
