//! Box storage: the read-only view of the content store the engine needs.

use crate::{BoxId, BoxPost, BoxRecord, RawOptions, RuleSet, SiteConfig, StoreError};
use std::collections::HashMap;

/// Read access to boxes, their options and their rules.
///
/// Implementations must be cheap to query repeatedly; the engine reads each
/// matched box once per request.
pub trait BoxStore {
    /// Fetch a box by id. `Ok(None)` means it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn get_box(&self, id: BoxId) -> Result<Option<BoxPost>, StoreError>;

    /// Fetch the raw options of a box. Unknown boxes yield an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn get_raw_options(&self, id: BoxId) -> Result<RawOptions, StoreError>;

    /// All rule sets, in stored box order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn get_all_rule_sets(&self) -> Result<Vec<(BoxId, RuleSet)>, StoreError>;
}

/// In-memory [`BoxStore`], typically built from a [`SiteConfig`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    order: Vec<BoxId>,
    posts: HashMap<BoxId, BoxPost>,
    options: HashMap<BoxId, RawOptions>,
    rules: HashMap<BoxId, RuleSet>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a box (builder pattern). Replacing keeps the box's
    /// original position.
    #[must_use]
    pub fn with_box(mut self, post: BoxPost, options: RawOptions, rules: RuleSet) -> Self {
        self.insert(post, options, rules);
        self
    }

    /// Add or replace a box.
    pub fn insert(&mut self, post: BoxPost, options: RawOptions, rules: RuleSet) {
        let id = post.id;
        if self.posts.insert(id, post).is_none() {
            self.order.push(id);
        }
        self.options.insert(id, options);
        self.rules.insert(id, rules);
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the store holds no box.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl From<&SiteConfig> for MemoryStore {
    fn from(site: &SiteConfig) -> Self {
        site.boxes.iter().fold(Self::new(), |store, record| {
            let BoxRecord { options, rules, .. } = record;
            store.with_box(record.post(), options.clone(), rules.clone())
        })
    }
}

impl BoxStore for MemoryStore {
    fn get_box(&self, id: BoxId) -> Result<Option<BoxPost>, StoreError> {
        Ok(self.posts.get(&id).cloned())
    }

    fn get_raw_options(&self, id: BoxId) -> Result<RawOptions, StoreError> {
        Ok(self.options.get(&id).cloned().unwrap_or_default())
    }

    fn get_all_rule_sets(&self) -> Result<Vec<(BoxId, RuleSet)>, StoreError> {
        Ok(self
            .order
            .iter()
            .map(|id| (*id, self.rules.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}
