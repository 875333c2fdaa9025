//! `RuleEvaluator` — dispatch a single condition against the request context.

use crate::{parse_value_list, BoxId, ConditionKind, Expr, RequestContext, Rule};
use tracing::warn;

/// Stateless evaluator for individual rules.
///
/// # INV: fail-closed
///
/// Unknown condition kinds and `manual` expressions that fail to parse
/// evaluate to `false`. Nothing on this path returns an error or panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluate a condition with its already-tokenized value list.
    ///
    /// `tokens` is ignored by `everywhere`; `manual` uses `raw` instead.
    pub fn matches(
        condition: &ConditionKind,
        tokens: &[String],
        raw: &str,
        ctx: &dyn RequestContext,
    ) -> bool {
        match condition {
            ConditionKind::Everywhere => true,
            ConditionKind::IsPostType => ctx.is_post_type(tokens),
            ConditionKind::IsSingle => ctx.is_single(tokens),
            ConditionKind::IsPost => ctx.is_post(tokens),
            ConditionKind::IsPage => ctx.is_page(tokens),
            ConditionKind::IsNotPage => !ctx.is_page(tokens),
            ConditionKind::IsUrl => ctx.is_url(tokens),
            ConditionKind::Manual => match Expr::parse(raw.trim()) {
                Ok(expr) => expr.evaluate(ctx),
                Err(err) => {
                    warn!(expression = raw, error = %err, "manual rule failed to parse, treating as no match");
                    false
                }
            },
            ConditionKind::Unknown(_) => false,
        }
    }

    /// Evaluate a stored rule: tokenize its value, then dispatch.
    ///
    /// `box_id` only attributes diagnostics.
    pub fn matches_rule(box_id: BoxId, rule: &Rule, ctx: &dyn RequestContext) -> bool {
        if let ConditionKind::Unknown(name) = &rule.condition {
            warn!(box_id = box_id.get(), condition = %name, "unknown rule condition");
            return false;
        }
        let tokens = if rule.condition.takes_list() {
            parse_value_list(&rule.value)
        } else {
            Vec::new()
        };
        Self::matches(&rule.condition, &tokens, &rule.value, ctx)
    }
}
