//! Hooks — ordered, injectable override points.
//!
//! Each seam is a named chain of callbacks. Filters transform a value and
//! hand it to the next filter; actions produce markup that is concatenated.
//! Chains run by ascending priority, then registration order.
//!
//! Hooks are assembled once with [`HooksBuilder`] and passed by reference to
//! whatever needs them. There is no global registry.
//!
//! # Example
//!
//! ```
//! use stb::{BoxId, HooksBuilder};
//!
//! let hooks = HooksBuilder::new()
//!     .show_box(|matched, id| matched || id == BoxId(42))
//!     .auto_hide_small_screens(|_, _| false)
//!     .build();
//!
//! assert!(hooks.show_box(false, BoxId(42)));
//! assert!(!hooks.auto_hide_small_screens(true, BoxId(1)));
//! ```

use crate::content::{autop, convert_chars, shortcode_unautop, ShortcodeRegistry};
use crate::{BoxId, BoxPost};
use std::fmt;
use std::sync::Arc;

/// Priority used when none is given.
pub const DEFAULT_PRIORITY: i32 = 10;

type FilterFn<V, A> = Box<dyn Fn(V, &A) -> V + Send + Sync>;
type ActionFn<A> = Box<dyn Fn(&A) -> String + Send + Sync>;

/// An ordered chain of value filters.
pub struct FilterChain<V, A: ?Sized> {
    entries: Vec<(i32, FilterFn<V, A>)>,
}

impl<V, A: ?Sized> FilterChain<V, A> {
    fn add(&mut self, priority: i32, filter: FilterFn<V, A>) {
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, filter));
    }

    /// Run `value` through every filter in order.
    pub fn apply(&self, value: V, arg: &A) -> V {
        self.entries.iter().fold(value, |v, (_, f)| f(v, arg))
    }

    /// Number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V, A: ?Sized> Default for FilterChain<V, A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// An ordered chain of markup-producing actions.
pub struct ActionChain<A: ?Sized> {
    entries: Vec<(i32, ActionFn<A>)>,
}

impl<A: ?Sized> ActionChain<A> {
    fn add(&mut self, priority: i32, action: ActionFn<A>) {
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, action));
    }

    /// Run every action and concatenate their output.
    pub fn render(&self, arg: &A) -> String {
        self.entries.iter().map(|(_, f)| f(arg)).collect()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: ?Sized> Default for ActionChain<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// All override points of the engine.
#[derive(Default)]
pub struct Hooks {
    show_box: FilterChain<bool, BoxId>,
    auto_hide_small_screens: FilterChain<bool, BoxId>,
    close_icon: FilterChain<String, BoxPost>,
    content: FilterChain<String, BoxPost>,
    before_content: ActionChain<BoxPost>,
    after_content: ActionChain<BoxPost>,
    box_css: ActionChain<BoxPost>,
}

impl Hooks {
    /// Final say on whether a box is shown, given the rule decision.
    pub fn show_box(&self, matched: bool, id: BoxId) -> bool {
        self.show_box.apply(matched, &id)
    }

    /// Whether a box without an explicit screen-size override auto-hides
    /// below its own width.
    pub fn auto_hide_small_screens(&self, enabled: bool, id: BoxId) -> bool {
        self.auto_hide_small_screens.apply(enabled, &id)
    }

    /// Markup of the close affordance.
    pub fn close_icon(&self, markup: String, post: &BoxPost) -> String {
        self.close_icon.apply(markup, post)
    }

    /// Run raw box content through the content filter chain.
    pub fn content(&self, content: String, post: &BoxPost) -> String {
        self.content.apply(content, post)
    }

    /// Markup injected right before the box content.
    pub fn before_content(&self, post: &BoxPost) -> String {
        self.before_content.render(post)
    }

    /// Markup injected right after the box content.
    pub fn after_content(&self, post: &BoxPost) -> String {
        self.after_content.render(post)
    }

    /// Extra CSS appended inside the box's `<style>` block.
    pub fn box_css(&self, post: &BoxPost) -> String {
        self.box_css.render(post)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("show_box", &self.show_box.len())
            .field("auto_hide_small_screens", &self.auto_hide_small_screens.len())
            .field("close_icon", &self.close_icon.len())
            .field("content", &self.content.len())
            .field("before_content", &self.before_content.len())
            .field("after_content", &self.after_content.len())
            .field("box_css", &self.box_css.len())
            .finish()
    }
}

/// Builder for [`Hooks`].
#[derive(Default)]
pub struct HooksBuilder {
    hooks: Hooks,
}

impl HooksBuilder {
    /// Start with every chain empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the standard content pipeline: character cleanup,
    /// paragraph wrapping and shortcode unwrapping at priority 10, shortcode
    /// expansion at 11. Typographic quotes and smileys are not part of it.
    #[must_use]
    pub fn standard(shortcodes: ShortcodeRegistry) -> Self {
        let shortcodes = Arc::new(shortcodes);
        Self::new()
            .content_filter(DEFAULT_PRIORITY, |content, _| convert_chars(&content))
            .content_filter(DEFAULT_PRIORITY, |content, _| autop(&content))
            .content_filter(DEFAULT_PRIORITY, |content, _| shortcode_unautop(&content))
            .content_filter(DEFAULT_PRIORITY + 1, move |content, _| {
                shortcodes.expand(&content)
            })
    }

    /// Add a `show_box` filter.
    #[must_use]
    pub fn show_box<F>(mut self, filter: F) -> Self
    where
        F: Fn(bool, BoxId) -> bool + Send + Sync + 'static,
    {
        self.hooks
            .show_box
            .add(DEFAULT_PRIORITY, Box::new(move |v: bool, id: &BoxId| filter(v, *id)));
        self
    }

    /// Add an `auto_hide_small_screens` filter.
    #[must_use]
    pub fn auto_hide_small_screens<F>(mut self, filter: F) -> Self
    where
        F: Fn(bool, BoxId) -> bool + Send + Sync + 'static,
    {
        self.hooks
            .auto_hide_small_screens
            .add(DEFAULT_PRIORITY, Box::new(move |v: bool, id: &BoxId| filter(v, *id)));
        self
    }

    /// Add a `close_icon` filter.
    #[must_use]
    pub fn close_icon<F>(mut self, filter: F) -> Self
    where
        F: Fn(String, &BoxPost) -> String + Send + Sync + 'static,
    {
        self.hooks.close_icon.add(DEFAULT_PRIORITY, Box::new(filter));
        self
    }

    /// Add a content filter at `priority`.
    #[must_use]
    pub fn content_filter<F>(mut self, priority: i32, filter: F) -> Self
    where
        F: Fn(String, &BoxPost) -> String + Send + Sync + 'static,
    {
        self.hooks.content.add(priority, Box::new(filter));
        self
    }

    /// Add a `before_content` action.
    #[must_use]
    pub fn before_content<F>(mut self, action: F) -> Self
    where
        F: Fn(&BoxPost) -> String + Send + Sync + 'static,
    {
        self.hooks
            .before_content
            .add(DEFAULT_PRIORITY, Box::new(action));
        self
    }

    /// Add an `after_content` action.
    #[must_use]
    pub fn after_content<F>(mut self, action: F) -> Self
    where
        F: Fn(&BoxPost) -> String + Send + Sync + 'static,
    {
        self.hooks
            .after_content
            .add(DEFAULT_PRIORITY, Box::new(action));
        self
    }

    /// Add a `box_css` action.
    #[must_use]
    pub fn box_css<F>(mut self, action: F) -> Self
    where
        F: Fn(&BoxPost) -> String + Send + Sync + 'static,
    {
        self.hooks.box_css.add(DEFAULT_PRIORITY, Box::new(action));
        self
    }

    /// Build the hooks.
    #[must_use]
    pub fn build(self) -> Hooks {
        self.hooks
    }
}

impl fmt::Debug for HooksBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HooksBuilder")
            .field("hooks", &self.hooks)
            .finish()
    }
}
