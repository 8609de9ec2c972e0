//! Plain-English restatement of builtin error messages.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s, each pairing an exception type with a message
//! pattern and a renderer. Classification scans the rules in registration order and the first
//! rule whose type is an ancestor of the error's category and whose pattern matches the whole
//! message wins. Order matters: some messages are textual subsets of others, and subclasses
//! (`UnboundLocalError`) must be tried before their parents (`NameError`).
//!
//! Messages no rule recognizes are passed through untouched.

use std::{fmt, sync::LazyLock};

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::exc_type::{ExcCategory, ExcType};

/// Renders a friendly message from the named groups a rule captured. Must not panic.
pub type Renderer = fn(&Groups) -> String;

/// Named capture groups of a matched message, in pattern order.
///
/// Optional groups that did not participate in the match are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Groups(IndexMap<String, String>);

impl Groups {
    /// Returns the captured text of `name`, or `""` when the group did not match.
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Whether `name` participated in the match.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over `(name, text)` pairs in pattern order.
    #[must_use]
    pub fn iter(&self) -> GroupsIter<'_> {
        self.into_iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_captures(pattern: &Regex, captures: &Captures<'_>) -> Self {
        let groups = pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|found| (name.to_owned(), found.as_str().to_owned()))
            })
            .collect();
        Self(groups)
    }
}

/// Iterator over the `(name, text)` pairs of [`Groups`].
pub type GroupsIter<'a> = std::iter::Map<indexmap::map::Iter<'a, String, String>, GroupPair<'a>>;

type GroupPair<'a> = fn((&'a String, &'a String)) -> (&'a str, &'a str);

fn group_pair<'a>((name, value): (&'a String, &'a String)) -> (&'a str, &'a str) {
    (name, value)
}

impl<'a> IntoIterator for &'a Groups {
    type Item = (&'a str, &'a str);
    type IntoIter = GroupsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().map(group_pair as GroupPair<'a>)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Groups {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
        )
    }
}

/// One known error shape: exception type, message pattern and renderer.
#[derive(Clone)]
pub struct Rule {
    name: &'static str,
    exc_type: ExcType,
    pattern: Regex,
    render: Renderer,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("exc_type", &self.exc_type)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Creates a rule. `pattern` must match the entire message, it is anchored at both ends.
    pub fn new(name: &'static str, exc_type: ExcType, pattern: &str, render: Renderer) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            exc_type,
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
            render,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    /// Returns the captured groups when the rule applies to this category and message.
    #[must_use]
    pub fn matches(&self, category: &ExcCategory, message: &str) -> Option<Groups> {
        if !category.is_a(self.exc_type) {
            return None;
        }
        let captures = self.pattern.captures(message)?;
        Some(Groups::from_captures(&self.pattern, &captures))
    }

    #[must_use]
    pub fn render(&self, groups: &Groups) -> String {
        (self.render)(groups)
    }
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Name of the rule that matched, `None` when the raw message was kept.
    pub rule: Option<&'static str>,
    pub groups: Groups,
    pub message: String,
}

/// Ordered, extensible collection of rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// A rule set that recognizes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The builtin catalog.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_RULES.clone()
    }

    /// Appends a rule with the lowest precedence.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Appends a rule with the lowest precedence.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Classifies a message; the first matching rule renders it, otherwise it is kept verbatim.
    #[must_use]
    pub fn classify(&self, category: &ExcCategory, message: &str) -> Classification {
        for rule in &self.rules {
            if let Some(groups) = rule.matches(category, message) {
                tracing::debug!(rule = rule.name, category = %category, "message classified");
                return Classification {
                    rule: Some(rule.name),
                    message: rule.render(&groups),
                    groups,
                };
            }
        }
        tracing::debug!(category = %category, "no rule matched, keeping raw message");
        Classification {
            rule: None,
            groups: Groups::default(),
            message: message.to_owned(),
        }
    }
}

/// Collapses interpreter-internal type spellings to the names users write.
#[must_use]
pub fn user_type_name(name: &str) -> &str {
    match name {
        "builtin_function_or_method" | "builtin_function" | "function" => "function",
        "method" | "method-wrapper" | "method_descriptor" | "wrapper_descriptor" | "classmethod_descriptor" => "method",
        "NoneType" => "None",
        "type" => "class",
        "string" => "str",
        "dict_keys" => "dict keys",
        "dict_values" => "dict values",
        "dict_items" => "dict items",
        "list_iterator" | "tuple_iterator" | "str_ascii_iterator" | "range_iterator" => "iterator",
        other => other,
    }
}

/// Normalizes operator spellings that carry implementation detail.
fn operator_name(op: &str) -> &str {
    match op {
        "** or pow()" => "**",
        "divmod()" => "divmod",
        other => other,
    }
}

fn plural(count: &str, noun: &str) -> String {
    if count == "1" {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn suggestion(groups: &Groups) -> String {
    if groups.contains("suggestion") {
        format!(" (did you mean {}?)", groups.get("suggestion"))
    } else {
        String::new()
    }
}

static BUILTIN_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    let table: [(&'static str, ExcType, &str, Renderer); 21] = [
        (
            "int-conversion",
            ExcType::ValueError,
            r"invalid literal for int\(\) with base (?P<base>\d+): (?P<value>.*)",
            |g| format!("cannot convert {} to int (base {})", g.get("value"), g.get("base")),
        ),
        (
            "float-conversion",
            ExcType::ValueError,
            r"could not convert string to float: (?P<value>.*)",
            |g| format!("cannot convert {} to float", g.get("value")),
        ),
        (
            "binary-operand",
            ExcType::TypeError,
            r"unsupported operand type\(s\) for (?P<op>.+): '(?P<left>.*)' and '(?P<right>.*)'",
            |g| {
                format!(
                    "cannot do `<{}> {} <{}>`",
                    user_type_name(g.get("left")),
                    operator_name(g.get("op")),
                    user_type_name(g.get("right"))
                )
            },
        ),
        (
            "concatenation",
            ExcType::TypeError,
            r#"can only concatenate .* \(not "(?P<right>.*)"\) to (?P<left>.*)"#,
            |g| {
                format!(
                    "cannot do `<{}> + <{}>`",
                    user_type_name(g.get("left")),
                    user_type_name(g.get("right"))
                )
            },
        ),
        (
            "unary-operand",
            ExcType::TypeError,
            r"bad operand type for unary (?P<op>\S+): '(?P<operand>.*)'",
            |g| format!("cannot do `{}<{}>`", g.get("op"), user_type_name(g.get("operand"))),
        ),
        (
            "not-subscriptable",
            ExcType::TypeError,
            r"'(?P<type>.*)' object is not subscriptable",
            |g| format!("`<{}>` values cannot be indexed", user_type_name(g.get("type"))),
        ),
        (
            "index-type",
            ExcType::TypeError,
            r"(?P<container>\w+) indices must be integers(?: or slices)?, not '?(?P<index>[^']*)'?",
            |g| {
                format!(
                    "cannot index `<{}>` with `<{}>`",
                    user_type_name(g.get("container")),
                    user_type_name(g.get("index"))
                )
            },
        ),
        (
            "slice-index",
            ExcType::TypeError,
            r"slice indices must be integers or None or have an __index__ method",
            |_| "slice bounds must be int or None".to_owned(),
        ),
        (
            "not-callable",
            ExcType::TypeError,
            r"'(?P<type>.*)' object is not callable",
            |g| format!("`<{}>` values cannot be called", user_type_name(g.get("type"))),
        ),
        (
            "argument-count",
            ExcType::TypeError,
            r"(?P<func>\S+)\(\) takes (?P<expected>(?:from \d+ to )?\d+) positional arguments? but (?P<given>\d+) (?:was|were) given",
            |g| {
                format!(
                    "`{}()` expects {}, got {}",
                    g.get("func"),
                    plural(g.get("expected"), "argument"),
                    g.get("given")
                )
            },
        ),
        (
            "missing-argument",
            ExcType::TypeError,
            r"(?P<func>\S+)\(\) missing (?P<count>\d+) required (?:positional|keyword-only) arguments?: (?P<names>.*)",
            |g| format!("`{}()` is missing {}", g.get("func"), g.get("names")),
        ),
        (
            "unbound-local",
            ExcType::UnboundLocalError,
            r"cannot access local variable (?P<name>'[^']*') where it is not associated with a value|local variable (?P<legacy>'[^']*') referenced before assignment",
            |g| {
                let name = if g.contains("name") { g.get("name") } else { g.get("legacy") };
                format!("{name} was used before it was assigned")
            },
        ),
        (
            "undefined-name",
            ExcType::NameError,
            r"name (?P<name>'[^']*') is not defined(?:\. Did you mean: (?P<suggestion>'[^']*')\?)?",
            |g| format!("{} is not defined{}", g.get("name"), suggestion(g)),
        ),
        (
            "module-attribute",
            ExcType::AttributeError,
            r"module '(?P<module>[^']*)' has no attribute '(?P<attr>[^']*)'(?:\. Did you mean: (?P<suggestion>'[^']*')\?)?",
            |g| {
                format!(
                    "module '{}' has no member named '{}'{}",
                    g.get("module"),
                    g.get("attr"),
                    suggestion(g)
                )
            },
        ),
        (
            "missing-attribute",
            ExcType::AttributeError,
            r"'(?P<type>[^']*)' object has no attribute '(?P<attr>[^']*)'(?:\. Did you mean: (?P<suggestion>'[^']*')\?)?",
            |g| {
                format!(
                    "`<{}>` values have no attribute '{}'{}",
                    user_type_name(g.get("type")),
                    g.get("attr"),
                    suggestion(g)
                )
            },
        ),
        (
            "index-range",
            ExcType::IndexError,
            r"(?P<container>\w+)(?: assignment)? index out of range",
            |g| format!("index out of range for this {}", user_type_name(g.get("container"))),
        ),
        (
            "missing-key",
            ExcType::KeyError,
            r"(?P<key>.+)",
            |g| format!("key {} not found", g.get("key")),
        ),
        (
            "zero-division",
            ExcType::ZeroDivisionError,
            r".*by zero",
            |_| "cannot divide by zero".to_owned(),
        ),
        (
            "module-not-found",
            ExcType::ModuleNotFoundError,
            r"No module named '(?P<module>[^']*)'",
            |g| format!("module '{}' could not be found", g.get("module")),
        ),
        (
            "import-name",
            ExcType::ImportError,
            r"cannot import name '(?P<name>[^']*)' from (?P<partial>partially initialized module )?'(?P<module>[^']*)'.*",
            |g| {
                if g.contains("partial") {
                    format!(
                        "cannot import '{}' from '{}' while it is still being imported (circular import?)",
                        g.get("name"),
                        g.get("module")
                    )
                } else {
                    format!("'{}' has no member named '{}'", g.get("module"), g.get("name"))
                }
            },
        ),
        (
            "syntax",
            ExcType::SyntaxError,
            r"(?P<msg>.*?)(?: \((?P<file>[^()]*), line (?P<line>\d+)\))?",
            |g| g.get("msg").to_owned(),
        ),
    ];

    let rules = table
        .into_iter()
        .map(|(name, exc_type, pattern, render)| {
            Rule::new(name, exc_type, pattern, render).expect("builtin rule patterns are valid")
        })
        .collect();
    RuleSet { rules }
});
