//! Rules and rule sets — the stored display conditions of a box.
//!
//! A [`RuleSet`] is the OR of its rules, evaluated in stored order with
//! first-match-wins semantics (see [`RuleSet::matches`]).

use crate::{BoxId, RequestContext, RuleEvaluator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of check a [`Rule`] performs.
///
/// The set is closed. Anything else found in storage (a typo, a condition
/// from a newer version) deserializes into [`ConditionKind::Unknown`] and
/// never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    /// Matches every request.
    Everywhere,
    /// Single view of any post type except pages.
    IsSingle,
    /// Single view of a `post`.
    IsPost,
    /// Page view.
    IsPage,
    /// Anything that is not a matching page view.
    IsNotPage,
    /// Current content type is one of the listed types.
    IsPostType,
    /// Request path matches one of the listed URL patterns.
    IsUrl,
    /// Administrator-authored boolean expression.
    Manual,
    /// Unrecognized condition; fail-closed.
    Unknown(String),
}

impl ConditionKind {
    /// Convert to the stored string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Everywhere => "everywhere",
            Self::IsSingle => "is_single",
            Self::IsPost => "is_post",
            Self::IsPage => "is_page",
            Self::IsNotPage => "is_not_page",
            Self::IsPostType => "is_post_type",
            Self::IsUrl => "is_url",
            Self::Manual => "manual",
            Self::Unknown(s) => s,
        }
    }

    /// Returns `true` if the rule value is a comma-separated token list.
    ///
    /// `manual` carries an expression and `everywhere` ignores its value.
    #[must_use]
    pub fn takes_list(&self) -> bool {
        !matches!(self, Self::Manual | Self::Everywhere)
    }
}

impl From<String> for ConditionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "everywhere" => Self::Everywhere,
            "is_single" => Self::IsSingle,
            "is_post" => Self::IsPost,
            "is_page" => Self::IsPage,
            "is_not_page" => Self::IsNotPage,
            "is_post_type" => Self::IsPostType,
            "is_url" => Self::IsUrl,
            "manual" => Self::Manual,
            _ => Self::Unknown(s),
        }
    }
}

impl From<&str> for ConditionKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single condition/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// What to check.
    pub condition: ConditionKind,
    /// Raw value as authored in the admin screen.
    #[serde(default)]
    pub value: String,
}

impl Rule {
    /// Create a rule.
    pub fn new(condition: impl Into<ConditionKind>, value: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            value: value.into(),
        }
    }

    /// The value as a token list: split on commas, trimmed, empties dropped.
    ///
    /// Empty for `manual` and `everywhere`, whose values are not lists.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        if self.condition.takes_list() {
            parse_value_list(&self.value)
        } else {
            Vec::new()
        }
    }
}

/// Split a rule value into trimmed, non-empty tokens.
///
/// ```
/// use stb::parse_value_list;
///
/// assert_eq!(parse_value_list(" 5, contact ,,"), vec!["5", "contact"]);
/// assert!(parse_value_list("  ").is_empty());
/// ```
#[must_use]
pub fn parse_value_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The ordered rules of one box.
///
/// # INV: first-match-wins
///
/// Rules are evaluated in stored order. The first matching rule terminates
/// evaluation; later rules are never consulted. An empty set never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a rule set from rules in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate the set against a request context.
    ///
    /// `box_id` is only used to attribute diagnostics.
    pub fn matches(&self, box_id: BoxId, ctx: &dyn RequestContext) -> bool {
        self.rules
            .iter()
            .any(|rule| RuleEvaluator::matches_rule(box_id, rule, ctx))
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
