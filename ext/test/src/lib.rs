//! stb-test: test contexts for the stb engine
//!
//! Builds [`PageView`]s from flat `key=value` pairs and provides a
//! [`RecordingContext`] that logs every predicate the engine consults.
//! The YAML conformance runner lives in [`fixture`] (feature `fixtures`).
//!
//! # Example
//!
//! ```
//! use stb::RequestContext;
//! use stb_test::page_view;
//!
//! let ctx = page_view([("type", "page"), ("id", "5"), ("slug", "contact")]).unwrap();
//! assert!(ctx.is_page(&["contact".to_string()]));
//! ```

use stb::{PageFlag, PageView, QueriedObject, RequestContext};
use std::cell::RefCell;
use thiserror::Error;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Keys understood by [`page_view`].
pub const CONTEXT_KEYS: [&str; 7] = ["type", "id", "slug", "title", "post_type", "path", "flags"];

/// A `key=value` pair that does not describe a page view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Key outside [`CONTEXT_KEYS`].
    #[error("unknown context key \"{0}\", expected one of: {keys}", keys = CONTEXT_KEYS.join(", "))]
    UnknownKey(String),

    /// `id` is not a non-negative integer.
    #[error("invalid id \"{0}\", expected a non-negative integer")]
    InvalidId(String),

    /// A flag name outside [`PageFlag`].
    #[error("unknown flag \"{0}\"")]
    UnknownFlag(String),
}

/// Build a [`PageView`] from flat pairs.
///
/// | Key | Meaning |
/// |-----|---------|
/// | `type` | queried object's post type (default `post`) |
/// | `id`, `slug`, `title` | queried object's names |
/// | `post_type` | content type override without a queried object |
/// | `path` | request path |
/// | `flags` | comma list of `front_page`, `home`, `archive`, `search`, `404`, `logged_in` |
///
/// A queried object exists iff any of `type`, `id`, `slug`, `title` is given.
///
/// # Errors
///
/// Returns [`ContextError`] for unknown keys, a bad `id`, or an unknown flag.
pub fn page_view<I, K, V>(pairs: I) -> Result<PageView, ContextError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut builder = PageView::builder();
    let mut post_type: Option<String> = None;
    let mut id: Option<u64> = None;
    let mut slug = String::new();
    let mut title = String::new();

    for (key, value) in pairs {
        let value = value.as_ref();
        match key.as_ref() {
            "type" => post_type = Some(value.to_string()),
            "id" => {
                id = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ContextError::InvalidId(value.to_string()))?,
                );
            }
            "slug" => slug = value.to_string(),
            "title" => title = value.to_string(),
            "post_type" => builder = builder.post_type(value),
            "path" => builder = builder.path(value),
            "flags" => {
                for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let flag = PageFlag::from_name(name)
                        .ok_or_else(|| ContextError::UnknownFlag(name.to_string()))?;
                    builder = builder.flag(flag);
                }
            }
            other => return Err(ContextError::UnknownKey(other.to_string())),
        }
    }

    if post_type.is_some() || id.is_some() || !slug.is_empty() || !title.is_empty() {
        let object = QueriedObject::new(
            post_type.unwrap_or_else(|| "post".to_string()),
            id.unwrap_or(0),
            slug,
        )
        .with_title(title);
        builder = builder.queried(object);
    }

    Ok(builder.build())
}

/// A [`RequestContext`] that records each predicate call, in order.
///
/// Calls are recorded as `name(arg,arg)`, e.g. `is_page(5,contact)`.
#[derive(Debug, Default)]
pub struct RecordingContext {
    inner: PageView,
    calls: RefCell<Vec<String>>,
}

impl RecordingContext {
    /// Wrap a page view.
    #[must_use]
    pub fn new(inner: PageView) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, name: &str, args: &[String]) {
        self.calls
            .borrow_mut()
            .push(format!("{name}({})", args.join(",")));
    }
}

impl RequestContext for RecordingContext {
    fn queried_object(&self) -> Option<&QueriedObject> {
        self.inner.queried_object()
    }

    fn request_path(&self) -> &str {
        self.inner.request_path()
    }

    fn has_flag(&self, flag: PageFlag) -> bool {
        self.record(flag.as_str(), &[]);
        self.inner.has_flag(flag)
    }

    fn post_type(&self) -> Option<&str> {
        self.inner.post_type()
    }

    fn is_singular(&self, types: &[String]) -> bool {
        self.record("is_singular", types);
        self.inner.is_singular(types)
    }

    fn is_single(&self, ids: &[String]) -> bool {
        self.record("is_single", ids);
        self.inner.is_single(ids)
    }

    fn is_page(&self, ids: &[String]) -> bool {
        self.record("is_page", ids);
        self.inner.is_page(ids)
    }

    fn is_post(&self, ids: &[String]) -> bool {
        self.record("is_post", ids);
        self.inner.is_post(ids)
    }

    fn is_post_type(&self, types: &[String]) -> bool {
        self.record("is_post_type", types);
        self.inner.is_post_type(types)
    }

    fn is_url(&self, patterns: &[String]) -> bool {
        self.record("is_url", patterns);
        self.inner.is_url(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stb::{BoxId, Expr, Rule, RuleSet};

    fn contact() -> PageView {
        page_view([
            ("type", "page"),
            ("id", "5"),
            ("slug", "contact"),
            ("path", "/contact/"),
        ])
        .unwrap()
    }

    #[test]
    fn page_view_from_pairs() {
        let ctx = page_view([
            ("id", "9"),
            ("slug", "hello"),
            ("title", "Hello"),
            ("flags", "logged_in, home"),
        ])
        .unwrap();
        let object = ctx.queried_object().unwrap();
        assert_eq!(object.post_type, "post");
        assert_eq!(object.id, 9);
        assert!(ctx.has_flag(PageFlag::LoggedIn));
        assert!(ctx.has_flag(PageFlag::Home));
        assert!(ctx.is_single(&["Hello".to_string()]));
    }

    #[test]
    fn page_view_without_object() {
        let ctx = page_view([("path", "/shop/"), ("post_type", "product")]).unwrap();
        assert!(ctx.queried_object().is_none());
        assert_eq!(ctx.post_type(), Some("product"));

        let empty = page_view(Vec::<(String, String)>::new()).unwrap();
        assert!(empty.queried_object().is_none());
        assert_eq!(empty.request_path(), "");
    }

    #[test]
    fn page_view_errors() {
        assert_eq!(
            page_view([("colour", "red")]).unwrap_err(),
            ContextError::UnknownKey("colour".into())
        );
        assert_eq!(
            page_view([("id", "-1")]).unwrap_err(),
            ContextError::InvalidId("-1".into())
        );
        assert_eq!(
            page_view([("flags", "home,weekend")]).unwrap_err(),
            ContextError::UnknownFlag("weekend".into())
        );
        assert!(ContextError::UnknownKey("x".into())
            .to_string()
            .contains("type, id, slug"));
    }

    #[test]
    fn rule_set_stops_at_first_match() {
        let ctx = RecordingContext::new(contact());
        let rules = RuleSet::new(vec![
            Rule::new("is_page", "7"),
            Rule::new("is_url", "/contact/"),
            Rule::new("is_single", ""),
        ]);
        assert!(rules.matches(BoxId(1), &ctx));
        assert_eq!(ctx.calls(), vec!["is_page(7)", "is_url(/contact/)"]);
    }

    #[test]
    fn rule_set_without_match_consults_every_rule() {
        let ctx = RecordingContext::new(contact());
        let rules = RuleSet::new(vec![
            Rule::new("is_page", "7"),
            Rule::new("is_single", ""),
            Rule::new("is_pgae", "5"),
        ]);
        assert!(!rules.matches(BoxId(1), &ctx));
        assert_eq!(ctx.calls(), vec!["is_page(7)", "is_single()"]);
    }

    #[test]
    fn everywhere_consults_nothing() {
        let ctx = RecordingContext::new(contact());
        let rules = RuleSet::new(vec![Rule::new("everywhere", ""), Rule::new("is_page", "")]);
        assert!(rules.matches(BoxId(1), &ctx));
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn expression_operators_short_circuit() {
        let ctx = RecordingContext::new(contact());

        let expr = Expr::parse("is_page(5) || is_single() || is_404()").unwrap();
        assert!(expr.evaluate(&ctx));
        assert_eq!(ctx.calls(), vec!["is_page(5)"]);

        ctx.clear();
        let expr = Expr::parse("is_single() && is_page(5)").unwrap();
        assert!(!expr.evaluate(&ctx));
        assert_eq!(ctx.calls(), vec!["is_single()"]);

        ctx.clear();
        let expr = Expr::parse("!is_search() && is_user_logged_in()").unwrap();
        assert!(!expr.evaluate(&ctx));
        assert_eq!(ctx.calls(), vec!["search()", "logged_in()"]);
    }
}
