//! Request context — the read-only view of the current page view.
//!
//! [`RequestContext`] exposes three raw facts (queried object, request path,
//! page flags) and derives the WordPress-style conditional predicates from
//! them. Implementors may override any predicate; the defaults follow the
//! "empty list = match any" convention.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Compiled wildcard patterns, keyed by normalized pattern.
static WILDCARDS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

/// Wildcard patterns kept before the cache is cleared.
const WILDCARD_CACHE_LIMIT: usize = 256;

/// The object the current request resolved to (a post, a page, a CPT entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueriedObject {
    /// Numeric id.
    pub id: u64,
    /// URL slug (`post_name`).
    pub slug: String,
    /// Title.
    pub title: String,
    /// Content type, e.g. `post`, `page`, `product`.
    pub post_type: String,
}

impl QueriedObject {
    /// Create a queried object of the given content type.
    pub fn new(post_type: impl Into<String>, id: u64, slug: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: String::new(),
            post_type: post_type.into(),
        }
    }

    /// A `page`.
    pub fn page(id: u64, slug: impl Into<String>) -> Self {
        Self::new("page", id, slug)
    }

    /// A `post`.
    pub fn post(id: u64, slug: impl Into<String>) -> Self {
        Self::new("post", id, slug)
    }

    /// Set the title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns `true` if `token` names this object by id, slug or title.
    #[must_use]
    pub fn is_named_by(&self, token: &str) -> bool {
        token.parse::<u64>().is_ok_and(|id| id == self.id)
            || (!self.slug.is_empty() && token == self.slug)
            || (!self.title.is_empty() && token == self.title)
    }

    /// Returns `true` if `ids` is empty or any token names this object.
    #[must_use]
    pub fn is_named_by_any(&self, ids: &[String]) -> bool {
        ids.is_empty() || ids.iter().any(|t| self.is_named_by(t))
    }
}

/// Boolean facts about the request that are not tied to a queried object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageFlag {
    /// Site front page.
    FrontPage,
    /// Blog posts index.
    Home,
    /// Any archive listing.
    Archive,
    /// Search results.
    Search,
    /// Not found.
    NotFound,
    /// A user is logged in.
    LoggedIn,
}

impl PageFlag {
    /// Every flag.
    pub const ALL: [Self; 6] = [
        Self::FrontPage,
        Self::Home,
        Self::Archive,
        Self::Search,
        Self::NotFound,
        Self::LoggedIn,
    ];

    /// Short name, as used on the command line and in fixtures.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrontPage => "front_page",
            Self::Home => "home",
            Self::Archive => "archive",
            Self::Search => "search",
            Self::NotFound => "404",
            Self::LoggedIn => "logged_in",
        }
    }

    /// Look a flag up by its short name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// Read-only facade over the current request.
pub trait RequestContext {
    /// The object this request resolved to, if any.
    fn queried_object(&self) -> Option<&QueriedObject>;

    /// The request path (query string allowed; it is ignored by matching).
    fn request_path(&self) -> &str;

    /// Whether a page flag is set.
    fn has_flag(&self, flag: PageFlag) -> bool;

    /// Current content type identifier.
    fn post_type(&self) -> Option<&str> {
        self.queried_object().map(|o| o.post_type.as_str())
    }

    /// Singular view of one of `types` (any type if empty).
    fn is_singular(&self, types: &[String]) -> bool {
        self.queried_object()
            .is_some_and(|o| types.is_empty() || types.iter().any(|t| *t == o.post_type))
    }

    /// Single view of a non-page, non-attachment object named in `ids`.
    fn is_single(&self, ids: &[String]) -> bool {
        self.queried_object().is_some_and(|o| {
            o.post_type != "page" && o.post_type != "attachment" && o.is_named_by_any(ids)
        })
    }

    /// Page view of a page named in `ids`.
    fn is_page(&self, ids: &[String]) -> bool {
        self.queried_object()
            .is_some_and(|o| o.post_type == "page" && o.is_named_by_any(ids))
    }

    /// Single view of a `post` named in `ids`.
    fn is_post(&self, ids: &[String]) -> bool {
        self.queried_object()
            .is_some_and(|o| o.post_type == "post" && o.is_named_by_any(ids))
    }

    /// Current content type is in `types` (any known type if empty).
    fn is_post_type(&self, types: &[String]) -> bool {
        self.post_type()
            .is_some_and(|current| types.is_empty() || types.iter().any(|t| t == current))
    }

    /// Request path matches one of `patterns` (any path if empty).
    fn is_url(&self, patterns: &[String]) -> bool {
        patterns.is_empty()
            || patterns
                .iter()
                .any(|p| url_pattern_matches(p, self.request_path()))
    }
}

/// Match a relative URL pattern against a request path.
///
/// The query string is ignored, trailing slashes are insignificant and `*`
/// matches any run of characters.
///
/// ```
/// use stb::url_pattern_matches;
///
/// assert!(url_pattern_matches("/contact/", "/contact?ref=nav"));
/// assert!(url_pattern_matches("/shop/*", "/shop/shoes/red"));
/// assert!(!url_pattern_matches("/shop/*", "/about"));
/// ```
#[must_use]
pub fn url_pattern_matches(pattern: &str, path: &str) -> bool {
    let path = normalize_path(path_only(path));
    let pattern = normalize_path(path_only(pattern.trim()));

    if !pattern.contains('*') {
        return pattern == path;
    }

    wildcard_matches(pattern, path)
}

fn wildcard_matches(pattern: &str, path: &str) -> bool {
    let mut cache = WILDCARDS
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return re.is_match(path);
    }

    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    let Ok(re) = Regex::new(&format!("^{escaped}$")) else {
        return false;
    };
    let matched = re.is_match(path);
    if cache.len() >= WILDCARD_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), re);
    matched
}

fn path_only(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// A concrete page view, built with [`PageView::builder`].
#[derive(Debug, Clone, Default)]
pub struct PageView {
    queried: Option<QueriedObject>,
    post_type: Option<String>,
    path: String,
    flags: Vec<PageFlag>,
}

impl PageView {
    /// Create a builder for `PageView`.
    #[must_use]
    pub fn builder() -> PageViewBuilder {
        PageViewBuilder::default()
    }
}

impl RequestContext for PageView {
    fn queried_object(&self) -> Option<&QueriedObject> {
        self.queried.as_ref()
    }

    fn request_path(&self) -> &str {
        &self.path
    }

    fn has_flag(&self, flag: PageFlag) -> bool {
        self.flags.contains(&flag)
    }

    fn post_type(&self) -> Option<&str> {
        self.post_type
            .as_deref()
            .or_else(|| self.queried.as_ref().map(|o| o.post_type.as_str()))
    }
}

/// Builder for `PageView`.
#[derive(Debug, Default)]
pub struct PageViewBuilder {
    view: PageView,
}

impl PageViewBuilder {
    /// Set the queried object.
    #[must_use]
    pub fn queried(mut self, object: QueriedObject) -> Self {
        self.view.queried = Some(object);
        self
    }

    /// Override the content type (e.g. on an archive of a custom type).
    #[must_use]
    pub fn post_type(mut self, post_type: impl Into<String>) -> Self {
        self.view.post_type = Some(post_type.into());
        self
    }

    /// Set the request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.view.path = path.into();
        self
    }

    /// Set a page flag.
    #[must_use]
    pub fn flag(mut self, flag: PageFlag) -> Self {
        if !self.view.flags.contains(&flag) {
            self.view.flags.push(flag);
        }
        self
    }

    /// Build the `PageView`.
    #[must_use]
    pub fn build(self) -> PageView {
        self.view
    }
}
