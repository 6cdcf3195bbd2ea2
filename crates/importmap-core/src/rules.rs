//! Include/exclude rules
//!
//! A rule is decided once, when options are parsed. Shapes that cannot be
//! turned into a rule are reported and replaced with an empty `AnyOf`, which
//! matches nothing: an include rule then keeps no artifacts and an exclude
//! rule drops none.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::{ImportMapError, Outcome};

#[derive(Debug, Clone)]
pub enum Rule {
    /// Exact match on the artifact name
    Literal(String),
    /// Any match of the expression within the name
    Pattern(Regex),
    /// Matches when any member matches
    AnyOf(Vec<Rule>),
}

impl Rule {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Rule::Literal(literal) => literal == name,
            Rule::Pattern(pattern) => pattern.is_match(name),
            Rule::AnyOf(rules) => rules.iter().any(|rule| rule.matches(name)),
        }
    }

    pub fn pattern(expression: &str) -> Result<Self, regex::Error> {
        Regex::new(expression).map(Rule::Pattern)
    }

    /// Parse a rule from its configuration value.
    ///
    /// Accepted shapes: a string (literal), `{ "regex": "...", "flags": "i" }`
    /// (pattern) or an array of those (any-of).
    pub fn from_value(option: &str, value: &Value) -> Outcome<Rule> {
        match value {
            Value::String(literal) => Outcome::clean(Rule::Literal(literal.clone())),
            Value::Array(items) => {
                let mut errors = Vec::new();
                let rules = items
                    .iter()
                    .map(|item| Rule::from_value(option, item).collect_into(&mut errors))
                    .collect();
                Outcome {
                    value: Rule::AnyOf(rules),
                    errors,
                }
            }
            Value::Object(fields) => match fields.get("regex") {
                Some(Value::String(expression)) => {
                    let flags = fields.get("flags").and_then(Value::as_str).unwrap_or("");
                    match compile(expression, flags) {
                        Ok(pattern) => Outcome::clean(Rule::Pattern(pattern)),
                        Err(source) => Outcome::with_error(
                            Rule::never(),
                            ImportMapError::InvalidPattern {
                                option: option.to_string(),
                                source,
                            },
                        ),
                    }
                }
                _ => unsupported(option, value),
            },
            _ => unsupported(option, value),
        }
    }

    fn never() -> Self {
        Rule::AnyOf(Vec::new())
    }
}

impl From<&str> for Rule {
    fn from(literal: &str) -> Self {
        Rule::Literal(literal.to_string())
    }
}

impl From<String> for Rule {
    fn from(literal: String) -> Self {
        Rule::Literal(literal)
    }
}

impl From<Regex> for Rule {
    fn from(pattern: Regex) -> Self {
        Rule::Pattern(pattern)
    }
}

impl<R: Into<Rule>> From<Vec<R>> for Rule {
    fn from(rules: Vec<R>) -> Self {
        Rule::AnyOf(rules.into_iter().map(Into::into).collect())
    }
}

fn unsupported(option: &str, value: &Value) -> Outcome<Rule> {
    Outcome::with_error(
        Rule::never(),
        ImportMapError::UnsupportedRule {
            option: option.to_string(),
            detail: value.to_string(),
        },
    )
}

/// Compile with JavaScript-style flags. `g`, `y`, `u` and `d` do not change
/// what a single test matches and are accepted silently.
fn compile(expression: &str, flags: &str) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(expression);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            _ => {}
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_is_exact() {
        let rule = Rule::from("one.js");
        assert!(rule.matches("one.js"));
        assert!(!rule.matches("one.js.map"));
    }

    #[test]
    fn test_mixed_array_from_value() {
        let outcome = Rule::from_value("include", &json!(["one.js", { "regex": "two" }]));
        assert!(outcome.is_clean());
        assert!(outcome.value.matches("one.js"));
        assert!(outcome.value.matches("two.js"));
        assert!(!outcome.value.matches("three.js"));
    }

    #[test]
    fn test_regex_flags() {
        let outcome = Rule::from_value("exclude", &json!({ "regex": "^ONE", "flags": "i" }));
        assert!(outcome.value.matches("one.js"));
    }

    #[test]
    fn test_unsupported_shape_matches_nothing() {
        let outcome = Rule::from_value("include", &json!(true));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].to_string().contains("include"));
        assert!(!outcome.value.matches("one.js"));
    }

    #[test]
    fn test_unsupported_member_keeps_valid_members() {
        let outcome = Rule::from_value("include", &json!(["one.js", false]));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.value.matches("one.js"));
        assert!(!outcome.value.matches("false"));
    }

    #[test]
    fn test_invalid_regex_reported() {
        let outcome = Rule::from_value("exclude", &json!({ "regex": "(" }));
        assert!(matches!(
            outcome.errors[0],
            ImportMapError::InvalidPattern { .. }
        ));
    }
}
