//! stb - display-rule engine for scroll-triggered boxes
//!
//! Decides, per page view, which boxes are shown and produces their
//! client-side configuration and markup.
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - [`Rule`] / [`RuleSet`] — stored display conditions, OR-ed, first match wins
//! - [`RuleEvaluator`] — one condition against a [`RequestContext`]
//! - [`Expr`] — the restricted expression language behind `manual` rules
//! - [`MatchFilter`] — all rule sets + the `show_box` hook → [`MatchedSet`]
//! - [`OptionsResolver`] — untyped [`RawOptions`] → [`ResolvedOptions`]
//! - [`PayloadBuilder`] / [`Renderer`] — wire payload and markup
//! - [`RequestScope`] — memoizes all of the above for one request
//!
//! Override points live in [`Hooks`], built once and passed by reference.
//!
//! # Key Design Insights
//!
//! 1. **Fail closed**: unknown conditions and malformed `manual` expressions
//!    never match. Evaluation never returns an error and never panics.
//!
//! 2. **No code execution**: `manual` rules are parsed into [`Expr`] over a
//!    fixed predicate table. Anything else is a parse error.
//!
//! 3. **One validation boundary**: raw options are coerced exactly once, in
//!    [`OptionsResolver`]. Everything downstream is typed.
//!
//! # Example
//!
//! ```
//! use stb::prelude::*;
//!
//! let store = MemoryStore::new().with_box(
//!     BoxPost::new(12, "Sign up for the newsletter!"),
//!     RawOptions::new(),
//!     RuleSet::new(vec![Rule::new("is_page", "5, contact")]),
//! );
//! let hooks = HooksBuilder::standard(ShortcodeRegistry::new()).build();
//! let settings = Settings::default();
//!
//! let page = PageView::builder()
//!     .queried(QueriedObject::page(5, "contact"))
//!     .path("/contact/")
//!     .build();
//!
//! let scope = RequestScope::new(&page, &store, &hooks, &settings);
//! assert_eq!(scope.matched_ids().as_slice(), &[BoxId(12)]);
//! assert!(scope.render().contains("<p>Sign up for the newsletter!</p>"));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod config;
mod context;
mod error;
mod evaluator;
mod filter;
mod post;
mod request;
mod rule;
mod store;
mod trace;

pub mod content;
pub mod expr;
pub mod hooks;
pub mod options;
pub mod payload;
pub mod render;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Data model
pub use post::{BoxId, BoxPost, PostStatus};
pub use rule::{parse_value_list, ConditionKind, Rule, RuleSet};

// Request context
pub use context::{
    url_pattern_matches, PageFlag, PageView, PageViewBuilder, QueriedObject, RequestContext,
};

// Evaluation
pub use evaluator::RuleEvaluator;
pub use expr::{Call, Expr, ManualPredicate};
pub use filter::{MatchFilter, MatchedSet};
pub use request::{MatchedBox, RequestScope};
pub use trace::{trace_box, BoxTrace, RuleTrace};

// Options, payload, markup
pub use content::{ShortcodeAttrs, ShortcodeRegistry};
pub use hooks::{Hooks, HooksBuilder};
pub use options::{
    Animation, CssOptions, OptionsResolver, Position, RawOptions, ResolvedOptions, TriggerKind,
};
pub use payload::{BoxPayload, Payload, PayloadBuilder};
pub use render::Renderer;

// Storage and configuration
pub use config::{BoxRecord, Settings, SiteConfig, VERSION};
pub use store::{BoxStore, MemoryStore};

// Errors
pub use error::{ConfigError, ExprError, StoreError};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use stb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Data model
        BoxId,
        BoxPost,
        // Storage
        BoxStore,
        ConditionKind,
        // Hooks
        Hooks,
        HooksBuilder,
        MemoryStore,
        // Context
        PageFlag,
        PageView,
        PostStatus,
        QueriedObject,
        // Options
        RawOptions,
        RequestContext,
        // Evaluation
        RequestScope,
        ResolvedOptions,
        Rule,
        RuleSet,
        Settings,
        ShortcodeRegistry,
        SiteConfig,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a `manual` expression.
///
/// Parentheses, negations and array arguments each add a level. Deeper
/// expressions are rejected at parse time, so evaluation cannot overflow the
/// stack.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of arguments in a single predicate call, after array
/// arguments are flattened.
pub const MAX_CALL_ARGS: usize = 256;
