//! `Renderer` — per-box style block and container markup.
//!
//! Output for one box:
//!
//! ```text
//! <style type="text/css">
//! #stb-12 {
//! background: white;
//! max-width: 400px;
//! }
//! @media (max-width: 400px) {
//! #stb-12 { display: none !important; }
//! }
//! </style>
//! <div class="stb-container stb-bottom-right-container">
//! <div class="scroll-triggered-box stb stb-bottom-right" id="stb-12" style="display: none;">
//! <div class="stb-content">…</div>
//! <span class="stb-close">&times;</span>
//! </div>
//! </div>
//! ```
//!
//! All boxes are wrapped in version comments and followed by a single shared
//! `<div id="stb-overlay"></div>`.

use crate::{Hooks, MatchedBox, Settings};
use std::fmt;

/// Renders the markup of matched boxes.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    settings: &'a Settings,
    hooks: &'a Hooks,
}

impl<'a> Renderer<'a> {
    /// Create a renderer.
    #[must_use]
    pub fn new(settings: &'a Settings, hooks: &'a Hooks) -> Self {
        Self { settings, hooks }
    }

    /// Render every published box. Returns an empty string when there is
    /// nothing to show.
    #[must_use]
    pub fn render(&self, boxes: &[MatchedBox]) -> String {
        let published: Vec<&MatchedBox> =
            boxes.iter().filter(|m| m.post.is_published()).collect();
        if published.is_empty() {
            return String::new();
        }
        Markup {
            renderer: self,
            boxes: &published,
        }
        .to_string()
    }

    /// Render the style block and container of a single box.
    #[must_use]
    pub fn render_box(&self, matched: &MatchedBox) -> String {
        BoxMarkup {
            renderer: self,
            matched,
        }
        .to_string()
    }
}

struct Markup<'r, 'a> {
    renderer: &'r Renderer<'a>,
    boxes: &'r [&'r MatchedBox],
}

impl fmt::Display for Markup<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<!-- Scroll Triggered Boxes v{} -->",
            escape_html(&self.renderer.settings.version)
        )?;
        for &matched in self.boxes {
            let markup = BoxMarkup {
                renderer: self.renderer,
                matched,
            };
            write!(f, "{markup}")?;
        }
        writeln!(f, "<div id=\"stb-overlay\"></div>")?;
        write!(f, "<!-- / Scroll Triggered Box -->")
    }
}

struct BoxMarkup<'r, 'a> {
    renderer: &'r Renderer<'a>,
    matched: &'r MatchedBox,
}

impl fmt::Display for BoxMarkup<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.renderer.hooks;
        let post = &self.matched.post;
        let opts = &self.matched.options;
        let css = &opts.css;
        let id = post.id;
        let position = escape_attr(css.position.as_str());

        writeln!(f, "<style type=\"text/css\">")?;
        writeln!(f, "#stb-{id} {{")?;
        writeln!(f, "background: {};", escape_html(&css.background_color))?;
        if let Some(color) = &css.color {
            writeln!(f, "color: {};", escape_html(color))?;
        }
        if let Some((width, color)) = css.border() {
            writeln!(f, "border: {width}px solid {};", escape_html(color))?;
        }
        if css.width > 0 {
            writeln!(f, "max-width: {}px;", css.width)?;
        } else {
            writeln!(f, "max-width: auto;")?;
        }
        writeln!(f, "}}")?;
        if opts.minimum_screen_width > 0 {
            writeln!(f, "@media (max-width: {}px) {{", opts.minimum_screen_width)?;
            writeln!(f, "#stb-{id} {{ display: none !important; }}")?;
            writeln!(f, "}}")?;
        }
        let extra_css = hooks.box_css(post);
        if !extra_css.is_empty() {
            writeln!(f, "{extra_css}")?;
        }
        writeln!(f, "</style>")?;

        let content = hooks.content(post.content.clone(), post);
        let close_icon = hooks.close_icon(self.renderer.settings.close_icon.clone(), post);

        writeln!(f, "<div class=\"stb-container stb-{position}-container\">")?;
        writeln!(
            f,
            "<div class=\"scroll-triggered-box stb stb-{position}\" id=\"stb-{id}\" style=\"display: none;\">"
        )?;
        writeln!(f, "<div class=\"stb-content\">")?;
        write!(f, "{}", hooks.before_content(post))?;
        write!(f, "{content}")?;
        writeln!(f, "{}", hooks.after_content(post))?;
        writeln!(f, "</div>")?;
        writeln!(f, "<span class=\"stb-close\">{close_icon}</span>")?;
        writeln!(f, "</div>")?;
        writeln!(f, "</div>")
    }
}

/// Escape text for an HTML text node.
///
/// ```
/// assert_eq!(stb::render::escape_html("<b>&"), "&lt;b&gt;&amp;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape text for a double- or single-quoted attribute value.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}
