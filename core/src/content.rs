//! Built-in content filters: character cleanup, paragraph wrapping and
//! shortcodes.
//!
//! These are the stages [`HooksBuilder::standard`](crate::HooksBuilder::standard)
//! installs on the `content` seam. Each is a plain `&str -> String` function so
//! callers can compose their own chain.
//!
//! Typographic replacement (curly quotes, dashes) and smiley images are not
//! provided. Register a content filter at priority 10 for either.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

static AMPERSAND: OnceLock<Regex> = OnceLock::new();
static LEGACY_VOID: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_BREAK: OnceLock<Regex> = OnceLock::new();
static BLOCK_TAG: OnceLock<Regex> = OnceLock::new();
static WRAPPED_SHORTCODE: OnceLock<Regex> = OnceLock::new();
static SHORTCODE_OPEN: OnceLock<Regex> = OnceLock::new();
static SHORTCODE_ATTR: OnceLock<Regex> = OnceLock::new();

fn ampersand() -> &'static Regex {
    AMPERSAND.get_or_init(|| {
        Regex::new(r"&(#[0-9]+;|#[xX][0-9A-Fa-f]+;|[A-Za-z][A-Za-z0-9]*;)?")
            .expect("valid ampersand regex")
    })
}

fn legacy_void() -> &'static Regex {
    LEGACY_VOID.get_or_init(|| Regex::new(r"(?i)<(br|hr)\s*/?>").expect("valid void tag regex"))
}

fn paragraph_break() -> &'static Regex {
    PARAGRAPH_BREAK.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("valid paragraph regex"))
}

fn block_tag() -> &'static Regex {
    BLOCK_TAG.get_or_init(|| {
        Regex::new(
            r"(?i)<(/?)(div|p|ul|ol|li|dl|dt|dd|h[1-6]|blockquote|table|thead|tbody|tfoot|tr|td|th|form|fieldset|pre|figure|figcaption|section|article|aside|header|footer|main|nav|hr|style|script|iframe)\b[^>]*>",
        )
        .expect("valid block tag regex")
    })
}

/// Open elements whose content may hold paragraphs.
const PARAGRAPH_CONTAINERS: [&str; 12] = [
    "div", "section", "article", "aside", "header", "footer", "main", "nav", "blockquote",
    "form", "fieldset", "figure",
];

fn wrapped_shortcode() -> &'static Regex {
    WRAPPED_SHORTCODE.get_or_init(|| {
        Regex::new(
            r"(?s)<p>\s*(\[[A-Za-z0-9_-]+[^\]]*\](?:[^\[]*\[/[A-Za-z0-9_-]+\])?)\s*</p>",
        )
        .expect("valid shortcode_unautop regex")
    })
}

fn shortcode_open() -> &'static Regex {
    SHORTCODE_OPEN.get_or_init(|| {
        Regex::new(r"\[([A-Za-z0-9_-]+)((?:\s[^\]]*)?)\]").expect("valid shortcode regex")
    })
}

fn shortcode_attr() -> &'static Regex {
    SHORTCODE_ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s'"]+))"#)
            .expect("valid shortcode attribute regex")
    })
}

/// Encode bare ampersands as `&#038;` and write `<br>`/`<hr>` in their
/// self-closing form. Existing entities are left alone.
///
/// ```
/// use stb::content::convert_chars;
///
/// assert_eq!(convert_chars("Tom & Jerry &amp; co"), "Tom &#038; Jerry &amp; co");
/// assert_eq!(convert_chars("a<br>b<HR>"), "a<br />b<hr />");
/// ```
#[must_use]
pub fn convert_chars(text: &str) -> String {
    let text = ampersand().replace_all(text, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            caps[0].to_string()
        } else {
            "&#038;".to_string()
        }
    });
    legacy_void()
        .replace_all(&text, |caps: &Captures<'_>| format!("<{} />", caps[1].to_ascii_lowercase()))
        .into_owned()
}

/// Wrap blank-line separated chunks in `<p>` and turn single newlines into
/// `<br />`.
///
/// Block-level tags always start or end a chunk. Open block elements are
/// tracked across chunks: text inside a `div`-like container is wrapped,
/// text inside lists, tables, `pre` and the like is left alone. A chunk whose
/// text touches its block tag on the same line (`<div>x</div>`) is kept as is.
///
/// ```
/// use stb::content::autop;
///
/// assert_eq!(autop("Hi\nthere\n\nBye"), "<p>Hi<br />\nthere</p>\n<p>Bye</p>");
/// assert_eq!(autop("<div>x</div>"), "<div>x</div>");
/// assert_eq!(
///     autop("<div>\nfirst\n\nsecond\n</div>"),
///     "<div>\n<p>first</p>\n<p>second</p>\n</div>"
/// );
/// ```
#[must_use]
pub fn autop(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let spaced = block_tag().replace_all(&text, |caps: &Captures<'_>| {
        if caps[1].is_empty() {
            format!("\n\n{}", &caps[0])
        } else {
            format!("{}\n\n", &caps[0])
        }
    });

    let mut open: Vec<String> = Vec::new();
    paragraph_break()
        .split(&spaced)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| autop_chunk(chunk, &mut open))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One chunk: at most a leading block tag, text, and a trailing closing tag.
fn autop_chunk(chunk: &str, open: &mut Vec<String>) -> String {
    let mut rest = chunk;

    let mut leading = "";
    if let Some(caps) = block_tag().captures(rest) {
        if caps.get(0).is_some_and(|m| m.start() == 0) {
            leading = caps.get(0).map_or("", |m| m.as_str());
            track_tag(&caps, open);
            rest = &rest[leading.len()..];
        }
    }

    let mut trailing = "";
    let mut trailing_name = None;
    if let Some(caps) = block_tag().captures_iter(rest).last() {
        if let Some(m) = caps.get(0).filter(|m| m.end() == rest.len() && &caps[1] == "/") {
            trailing = m.as_str();
            trailing_name = Some(caps[2].to_ascii_lowercase());
            rest = &rest[..m.start()];
        }
    }

    let text = rest.trim();
    let tight = (!leading.is_empty() && !rest.starts_with(char::is_whitespace))
        || (!trailing.is_empty() && !rest.ends_with(char::is_whitespace));
    let allows_paragraphs = open
        .last()
        .map_or(true, |tag| PARAGRAPH_CONTAINERS.contains(&tag.as_str()));

    let out = if text.is_empty() || tight || !allows_paragraphs {
        chunk.to_string()
    } else {
        let paragraph = format!("<p>{}</p>", text.replace('\n', "<br />\n"));
        [leading, paragraph.as_str(), trailing]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    };

    if let Some(name) = trailing_name {
        close_tag(&name, open);
    }
    out
}

fn track_tag(caps: &Captures<'_>, open: &mut Vec<String>) {
    let name = caps[2].to_ascii_lowercase();
    if &caps[1] == "/" {
        close_tag(&name, open);
    } else if name != "hr" && !caps[0].ends_with("/>") {
        open.push(name);
    }
}

/// Pop up to and including the innermost `name`; stray closers are ignored.
fn close_tag(name: &str, open: &mut Vec<String>) {
    if let Some(pos) = open.iter().rposition(|tag| tag == name) {
        open.truncate(pos);
    }
}

/// Undo paragraph wrapping around standalone shortcodes.
///
/// ```
/// use stb::content::shortcode_unautop;
///
/// assert_eq!(shortcode_unautop("<p>[form id=\"3\"]</p>"), "[form id=\"3\"]");
/// assert_eq!(shortcode_unautop("<p>Say [b]hi[/b]</p>"), "<p>Say [b]hi[/b]</p>");
/// ```
#[must_use]
pub fn shortcode_unautop(text: &str) -> String {
    wrapped_shortcode()
        .replace_all(text, |caps: &Captures<'_>| caps[1].to_string())
        .into_owned()
}

/// Attributes of a shortcode tag, by name.
pub type ShortcodeAttrs = BTreeMap<String, String>;

type ShortcodeFn = Box<dyn Fn(&ShortcodeAttrs, Option<&str>) -> String + Send + Sync>;

/// Named shortcode handlers.
///
/// A handler receives the tag's attributes and, for enclosing shortcodes
/// (`[name]inner[/name]`), the inner content. Unregistered shortcodes are
/// left verbatim.
#[derive(Default)]
pub struct ShortcodeRegistry {
    handlers: HashMap<String, ShortcodeFn>,
}

impl ShortcodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler (builder pattern). Re-registering a name replaces it.
    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ShortcodeAttrs, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Returns `true` if `name` has a handler.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Expand every registered shortcode in `text`.
    #[must_use]
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(caps) = shortcode_open().captures(rest) {
            let Some(whole) = caps.get(0) else { break };
            let name = &caps[1];
            out.push_str(&rest[..whole.start()]);
            let after = &rest[whole.end()..];

            let Some(handler) = self.handlers.get(name) else {
                out.push_str(whole.as_str());
                rest = after;
                continue;
            };

            let attrs = parse_attrs(caps.get(2).map_or("", |m| m.as_str()));
            let close = format!("[/{name}]");
            if let Some(end) = after.find(&close) {
                out.push_str(&handler(&attrs, Some(&after[..end])));
                rest = &after[end + close.len()..];
            } else {
                out.push_str(&handler(&attrs, None));
                rest = after;
            }
        }

        out.push_str(rest);
        out
    }
}

impl fmt::Debug for ShortcodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ShortcodeRegistry")
            .field("handlers", &names)
            .finish()
    }
}

fn parse_attrs(raw: &str) -> ShortcodeAttrs {
    shortcode_attr()
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}
