//! `MatchFilter` — aggregate rule decisions into the set of boxes to load.

use crate::{BoxId, Hooks, RequestContext, RuleSet};
use std::collections::HashSet;
use tracing::debug;

/// Ordered, de-duplicated set of boxes selected for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedSet {
    ids: Vec<BoxId>,
}

impl MatchedSet {
    /// Returns `true` if `id` was selected.
    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected ids in input order.
    pub fn iter(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.ids.iter().copied()
    }

    /// Selected ids as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[BoxId] {
        &self.ids
    }

    /// Number of selected boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<BoxId> for MatchedSet {
    fn from_iter<I: IntoIterator<Item = BoxId>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        Self {
            ids: iter.into_iter().filter(|id| seen.insert(*id)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MatchedSet {
    type Item = BoxId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, BoxId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter().copied()
    }
}

/// Runs every box's rule set and lets the `show_box` hook have the final
/// word.
#[derive(Debug, Clone, Copy)]
pub struct MatchFilter<'a> {
    hooks: &'a Hooks,
}

impl<'a> MatchFilter<'a> {
    /// Create a filter using `hooks` for the `show_box` override.
    #[must_use]
    pub fn new(hooks: &'a Hooks) -> Self {
        Self { hooks }
    }

    /// Decide a single box.
    #[must_use]
    pub fn decide(&self, box_id: BoxId, rules: &RuleSet, ctx: &dyn RequestContext) -> bool {
        let matched = rules.matches(box_id, ctx);
        let shown = self.hooks.show_box(matched, box_id);
        debug!(box_id = box_id.get(), matched, shown, "box decision");
        shown
    }

    /// Compute the matched set for a request. Input order is kept and a
    /// repeated id is decided only once.
    #[must_use]
    pub fn compute_matched_boxes(
        &self,
        rule_sets: &[(BoxId, RuleSet)],
        ctx: &dyn RequestContext,
    ) -> MatchedSet {
        let mut decided = HashSet::with_capacity(rule_sets.len());
        rule_sets
            .iter()
            .filter(|(id, _)| decided.insert(*id))
            .filter(|(id, rules)| self.decide(*id, rules, ctx))
            .map(|(id, _)| *id)
            .collect()
    }
}
