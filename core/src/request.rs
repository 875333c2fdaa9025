//! `RequestScope` — everything the engine computes for one page view.
//!
//! The matched set and the loaded boxes are computed lazily and at most once
//! per scope. A scope lives as long as the request; nothing is shared across
//! requests.

use crate::{
    BoxId, BoxPost, BoxStore, Hooks, MatchFilter, MatchedSet, OptionsResolver, Payload,
    PayloadBuilder, Renderer, RequestContext, ResolvedOptions, Settings, StoreError,
};
use std::cell::OnceCell;
use tracing::{debug, warn};

/// A matched, published box with its resolved options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedBox {
    /// The stored box.
    pub post: BoxPost,
    /// Its options after resolution.
    pub options: ResolvedOptions,
}

/// Request-scoped evaluation state.
///
/// ```
/// use stb::{HooksBuilder, MemoryStore, PageView, RawOptions, RequestScope, Rule, RuleSet, Settings, BoxPost};
///
/// let store = MemoryStore::new().with_box(
///     BoxPost::new(1, "Hi"),
///     RawOptions::new(),
///     RuleSet::new(vec![Rule::new("everywhere", "")]),
/// );
/// let hooks = HooksBuilder::new().build();
/// let settings = Settings::default();
/// let page = PageView::builder().path("/").build();
///
/// let scope = RequestScope::new(&page, &store, &hooks, &settings);
/// assert!(scope.has_boxes());
/// assert_eq!(scope.payload().len(), 1);
/// ```
pub struct RequestScope<'a> {
    ctx: &'a dyn RequestContext,
    store: &'a dyn BoxStore,
    hooks: &'a Hooks,
    settings: &'a Settings,
    matched_ids: OnceCell<MatchedSet>,
    matched_boxes: OnceCell<Vec<MatchedBox>>,
}

impl<'a> RequestScope<'a> {
    /// Create a scope for one request.
    #[must_use]
    pub fn new(
        ctx: &'a dyn RequestContext,
        store: &'a dyn BoxStore,
        hooks: &'a Hooks,
        settings: &'a Settings,
    ) -> Self {
        Self {
            ctx,
            store,
            hooks,
            settings,
            matched_ids: OnceCell::new(),
            matched_boxes: OnceCell::new(),
        }
    }

    /// Ids of the boxes selected for this request.
    ///
    /// A store failure is logged and yields an empty set.
    pub fn matched_ids(&self) -> &MatchedSet {
        self.matched_ids.get_or_init(|| match self.store.get_all_rule_sets() {
            Ok(rule_sets) => {
                MatchFilter::new(self.hooks).compute_matched_boxes(&rule_sets, self.ctx)
            }
            Err(err) => {
                warn!(error = %err, "failed to load rule sets, no boxes matched");
                MatchedSet::default()
            }
        })
    }

    /// Matched boxes that exist and are published, with resolved options.
    pub fn matched_boxes(&self) -> &[MatchedBox] {
        self.matched_boxes.get_or_init(|| {
            let resolver = OptionsResolver::new(self.settings, self.hooks);
            self.matched_ids()
                .iter()
                .filter_map(|id| match self.load(id, &resolver) {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        warn!(box_id = id.get(), error = %err, "failed to load box, skipping");
                        None
                    }
                })
                .collect()
        })
    }

    /// Returns `true` if at least one box will be shown.
    pub fn has_boxes(&self) -> bool {
        !self.matched_boxes().is_empty()
    }

    /// Client-side configuration of the shown boxes.
    pub fn payload(&self) -> Payload {
        PayloadBuilder::build(self.matched_boxes())
    }

    /// Markup of the shown boxes; empty when there are none.
    pub fn render(&self) -> String {
        Renderer::new(self.settings, self.hooks).render(self.matched_boxes())
    }

    fn load(
        &self,
        id: BoxId,
        resolver: &OptionsResolver<'_>,
    ) -> Result<Option<MatchedBox>, StoreError> {
        let Some(post) = self.store.get_box(id)? else {
            debug!(box_id = id.get(), "matched box does not exist");
            return Ok(None);
        };
        if !post.is_published() {
            debug!(box_id = id.get(), status = post.status.as_str(), "matched box is not published");
            return Ok(None);
        }
        let raw = self.store.get_raw_options(id)?;
        Ok(Some(MatchedBox {
            options: resolver.resolve(id, &raw),
            post,
        }))
    }
}

impl std::fmt::Debug for RequestScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("matched_ids", &self.matched_ids.get())
            .field("matched_boxes", &self.matched_boxes.get().map(Vec::len))
            .finish_non_exhaustive()
    }
}
