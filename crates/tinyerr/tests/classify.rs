use pretty_assertions::assert_eq;
use tinyerr::{ExcCategory, ExcType, Groups, Rule, RuleSet};

fn builtin(type_name: &str, message: &str) -> String {
    RuleSet::builtin()
        .classify(&ExcCategory::new(type_name, Vec::new()), message)
        .message
}

#[test]
fn conversions() {
    assert_eq!(
        builtin("ValueError", "invalid literal for int() with base 10: 'abc'"),
        "cannot convert 'abc' to int (base 10)"
    );
    assert_eq!(
        builtin("ValueError", "could not convert string to float: 'abc'"),
        "cannot convert 'abc' to float"
    );
}

#[test]
fn operands() {
    assert_eq!(
        builtin("TypeError", "unsupported operand type(s) for +: 'int' and 'str'"),
        "cannot do `<int> + <str>`"
    );
    assert_eq!(
        builtin("TypeError", "unsupported operand type(s) for ** or pow(): 'str' and 'int'"),
        "cannot do `<str> ** <int>`"
    );
    assert_eq!(
        builtin("TypeError", r#"can only concatenate str (not "int") to str"#),
        "cannot do `<str> + <int>`"
    );
    assert_eq!(
        builtin("TypeError", r#"can only concatenate list (not "NoneType") to list"#),
        "cannot do `<list> + <None>`"
    );
    assert_eq!(builtin("TypeError", "bad operand type for unary -: 'str'"), "cannot do `-<str>`");
}

#[test]
fn indexing_and_calls() {
    assert_eq!(
        builtin("TypeError", "'int' object is not subscriptable"),
        "`<int>` values cannot be indexed"
    );
    assert_eq!(
        builtin("TypeError", "list indices must be integers or slices, not str"),
        "cannot index `<list>` with `<str>`"
    );
    assert_eq!(
        builtin("TypeError", "slice indices must be integers or None or have an __index__ method"),
        "slice bounds must be int or None"
    );
    assert_eq!(
        builtin("TypeError", "'NoneType' object is not callable"),
        "`<None>` values cannot be called"
    );
    assert_eq!(
        builtin("IndexError", "list index out of range"),
        "index out of range for this list"
    );
    assert_eq!(builtin("KeyError", "'a'"), "key 'a' not found");
}

#[test]
fn arguments() {
    assert_eq!(
        builtin("TypeError", "f() takes 1 positional argument but 2 were given"),
        "`f()` expects 1 argument, got 2"
    );
    assert_eq!(
        builtin("TypeError", "Point.move() takes from 1 to 2 positional arguments but 3 were given"),
        "`Point.move()` expects from 1 to 2 arguments, got 3"
    );
    assert_eq!(
        builtin("TypeError", "f() missing 1 required positional argument: 'x'"),
        "`f()` is missing 'x'"
    );
}

#[test]
fn names() {
    assert_eq!(
        builtin(
            "UnboundLocalError",
            "cannot access local variable 'x' where it is not associated with a value"
        ),
        "'x' was used before it was assigned"
    );
    assert_eq!(
        builtin("UnboundLocalError", "local variable 'x' referenced before assignment"),
        "'x' was used before it was assigned"
    );
    assert_eq!(builtin("NameError", "name 'x' is not defined"), "'x' is not defined");
    assert_eq!(
        builtin("NameError", "name 'pritn' is not defined. Did you mean: 'print'?"),
        "'pritn' is not defined (did you mean 'print'?)"
    );
}

#[test]
fn attributes_and_imports() {
    assert_eq!(
        builtin("AttributeError", "'int' object has no attribute 'foo'"),
        "`<int>` values have no attribute 'foo'"
    );
    assert_eq!(
        builtin("AttributeError", "module 'os' has no attribute 'foo'"),
        "module 'os' has no member named 'foo'"
    );
    assert_eq!(
        builtin("ModuleNotFoundError", "No module named 'foo'"),
        "module 'foo' could not be found"
    );
    assert_eq!(
        builtin("ImportError", "cannot import name 'bar' from 'foo' (/srv/foo.py)"),
        "'foo' has no member named 'bar'"
    );
    assert_eq!(
        builtin(
            "ImportError",
            "cannot import name 'bar' from partially initialized module 'foo' \
             (most likely due to a circular import) (/srv/foo.py)"
        ),
        "cannot import 'bar' from 'foo' while it is still being imported (circular import?)"
    );
}

#[test]
fn arithmetic_and_syntax() {
    assert_eq!(builtin("ZeroDivisionError", "division by zero"), "cannot divide by zero");
    assert_eq!(builtin("ZeroDivisionError", "integer modulo by zero"), "cannot divide by zero");
    assert_eq!(builtin("SyntaxError", "invalid syntax (main.py, line 3)"), "invalid syntax");
    assert_eq!(builtin("SyntaxError", "invalid syntax"), "invalid syntax");
    assert_eq!(
        builtin("IndentationError", "unexpected indent (main.py, line 2)"),
        "unexpected indent"
    );
}

#[test]
fn unknown_messages_are_kept() {
    let classification = RuleSet::builtin().classify(&ExcType::ValueError.into(), "something odd");
    assert_eq!(classification.rule, None);
    assert_eq!(classification.message, "something odd");
    assert!(classification.groups.is_empty());

    // a KeyError without a key has nothing to restate
    assert_eq!(builtin("KeyError", ""), "");
}

#[test]
fn category_must_be_an_ancestor() {
    assert_eq!(builtin("TypeError", "division by zero"), "division by zero");
    assert_eq!(builtin("RuntimeError", "'a'"), "'a'");
}

#[test]
fn user_subclass_uses_its_bases() {
    let category = ExcCategory::new(
        "ParseFailure",
        ["ValueError", "Exception", "BaseException", "object"]
            .map(str::to_owned)
            .to_vec(),
    );
    let classification = RuleSet::builtin().classify(&category, "invalid literal for int() with base 16: 'zz'");
    assert_eq!(classification.rule, Some("int-conversion"));
    assert_eq!(classification.message, "cannot convert 'zz' to int (base 16)");
}

#[test]
fn subclass_falls_through_to_parent_rules() {
    let classification = RuleSet::builtin().classify(&ExcType::UnboundLocalError.into(), "name 'x' is not defined");
    assert_eq!(classification.rule, Some("undefined-name"));
}

#[test]
fn groups_are_exposed() {
    let classification = RuleSet::builtin().classify(
        &ExcType::TypeError.into(),
        "unsupported operand type(s) for -: 'str' and 'builtin_function_or_method'",
    );
    assert_eq!(classification.rule, Some("binary-operand"));
    assert_eq!(
        classification.groups,
        Groups::from([("op", "-"), ("left", "str"), ("right", "builtin_function_or_method")])
    );
    assert_eq!(classification.message, "cannot do `<str> - <function>`");
    assert_eq!(classification.groups.get("suggestion"), "");

    let pairs: Vec<_> = classification.groups.iter().collect();
    assert_eq!(pairs, [("op", "-"), ("left", "str"), ("right", "builtin_function_or_method")]);
    let mut names = Vec::new();
    for (name, _) in &classification.groups {
        names.push(name);
    }
    assert_eq!(names, ["op", "left", "right"]);
}

#[test]
fn first_registered_rule_wins() {
    let rules = RuleSet::empty()
        .with_rule(Rule::new("first", ExcType::Exception, ".*", |_| "first".to_owned()).unwrap())
        .with_rule(Rule::new("second", ExcType::ValueError, ".*", |_| "second".to_owned()).unwrap());
    let classification = rules.classify(&ExcType::ValueError.into(), "anything");
    assert_eq!(classification.rule, Some("first"));
    assert_eq!(classification.message, "first");
}

#[test]
fn catalog_is_open() {
    let rules = RuleSet::builtin().with_rule(
        Rule::new("exploded", ExcType::RuntimeError, r"boom (?P<count>\d+)", |g| {
            format!("exploded {} times", g.get("count"))
        })
        .unwrap(),
    );
    assert_eq!(rules.rules().len(), RuleSet::builtin().rules().len() + 1);
    let classification = rules.classify(&ExcType::RuntimeError.into(), "boom 3");
    assert_eq!(classification.message, "exploded 3 times");
    assert!(rules.get("exploded").is_some());
}

/// Patterns must match the whole message, not a prefix.
#[test]
fn patterns_are_anchored() {
    let rule = Rule::new("exact", ExcType::ValueError, "bad", |_| "matched".to_owned()).unwrap();
    assert!(rule.matches(&ExcType::ValueError.into(), "bad").is_some());
    assert!(rule.matches(&ExcType::ValueError.into(), "bad value").is_none());
    assert!(rule.matches(&ExcType::ValueError.into(), "really bad").is_none());
}

#[test]
fn invalid_pattern_is_rejected() {
    assert!(Rule::new("broken", ExcType::ValueError, "(unclosed", |_| String::new()).is_err());
}
