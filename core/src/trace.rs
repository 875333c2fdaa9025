//! Evaluation traces: why a box was or was not selected.
//!
//! A trace mirrors [`RuleSet::matches`](crate::RuleSet::matches) step by
//! step, including short-circuit: rules after the first match are listed
//! but marked as not evaluated.
//!
//! # Example
//!
//! ```
//! use stb::{trace_box, BoxId, Hooks, PageView, QueriedObject, Rule, RuleSet};
//!
//! let rules = RuleSet::new(vec![
//!     Rule::new("is_page", "contact"),
//!     Rule::new("everywhere", ""),
//! ]);
//! let page = PageView::builder().queried(QueriedObject::page(5, "contact")).build();
//!
//! let trace = trace_box(BoxId(1), &rules, &page, &Hooks::default());
//! assert!(trace.matched);
//! assert!(trace.rules[0].matched);
//! assert!(!trace.rules[1].evaluated);
//! ```

use crate::{BoxId, ConditionKind, Expr, Hooks, RequestContext, Rule, RuleEvaluator, RuleSet};
use std::fmt;

/// Trace of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTrace {
    /// Condition as stored.
    pub condition: ConditionKind,
    /// Raw stored value.
    pub value: String,
    /// Parsed value list (empty for `everywhere` and `manual`).
    pub tokens: Vec<String>,
    /// `false` if an earlier rule already matched.
    pub evaluated: bool,
    /// Result; `false` when not evaluated.
    pub matched: bool,
    /// Why the rule could not be evaluated (unknown condition, bad
    /// expression).
    pub error: Option<String>,
}

/// Trace of one box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxTrace {
    /// The box.
    pub box_id: BoxId,
    /// Every rule in stored order.
    pub rules: Vec<RuleTrace>,
    /// Decision of the rules alone.
    pub raw_matched: bool,
    /// Decision after the `show_box` hook.
    pub matched: bool,
}

impl BoxTrace {
    /// The first matching rule, if any.
    #[must_use]
    pub fn matching_rule(&self) -> Option<&RuleTrace> {
        self.rules.iter().find(|r| r.matched)
    }

    /// Returns `true` if the hook changed the decision.
    #[must_use]
    pub fn overridden(&self) -> bool {
        self.raw_matched != self.matched
    }
}

/// Evaluate `rules` like [`MatchFilter`](crate::MatchFilter) does, recording
/// every step.
#[must_use]
pub fn trace_box(
    box_id: BoxId,
    rules: &RuleSet,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> BoxTrace {
    let mut raw_matched = false;
    let traces: Vec<RuleTrace> = rules
        .rules()
        .iter()
        .map(|rule| {
            let mut trace = RuleTrace {
                condition: rule.condition.clone(),
                value: rule.value.clone(),
                tokens: rule.tokens(),
                evaluated: !raw_matched,
                matched: false,
                error: diagnose(rule),
            };
            if trace.evaluated {
                trace.matched = RuleEvaluator::matches_rule(box_id, rule, ctx);
                raw_matched = trace.matched;
            }
            trace
        })
        .collect();

    BoxTrace {
        box_id,
        rules: traces,
        raw_matched,
        matched: hooks.show_box(raw_matched, box_id),
    }
}

fn diagnose(rule: &Rule) -> Option<String> {
    match &rule.condition {
        ConditionKind::Unknown(name) => Some(format!("unknown condition `{name}`")),
        ConditionKind::Manual => Expr::parse(rule.value.trim()).err().map(|e| e.to_string()),
        _ => None,
    }
}

impl fmt::Display for RuleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match (self.evaluated, self.matched) {
            (false, _) => "skipped",
            (true, true) => "match",
            (true, false) => "no match",
        };
        write!(f, "{}", self.condition)?;
        if !self.value.is_empty() {
            write!(f, " {:?}", self.value)?;
        }
        write!(f, " -> {verdict}")?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

impl fmt::Display for BoxTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.matched { "shown" } else { "hidden" };
        write!(f, "box {}: {verdict}", self.box_id)?;
        if self.overridden() {
            write!(f, " (show_box hook overrode rules)")?;
        }
        if self.rules.is_empty() {
            write!(f, "\n  (no rules)")?;
        }
        for (i, rule) in self.rules.iter().enumerate() {
            write!(f, "\n  [{i}] {rule}")?;
        }
        Ok(())
    }
}
