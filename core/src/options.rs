//! Per-box option resolution.
//!
//! Stored options are an untyped key/value map ([`RawOptions`]). They are
//! validated exactly once, here, into [`ResolvedOptions`]. Nothing downstream
//! touches the raw map.
//!
//! Coercion is lenient and never fails:
//!
//! - missing keys take their defaults
//! - numeric fields take the leading integer of a string, truncate JSON
//!   numbers, and clamp negatives and garbage to 0
//! - boolean fields use loose truthiness (`""`, `"0"`, `0`, `null`, `false`
//!   and empty containers are false)
//! - unknown enum strings fall back to the default variant

use crate::{BoxId, Hooks, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Untyped stored options of one box.
pub type RawOptions = Map<String, Value>;

/// Default scroll percentage for the `percentage` trigger.
pub const DEFAULT_TRIGGER_PERCENTAGE: u32 = 65;

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "white";

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident { #[default] $default:ident = $default_str:literal, $($variant:ident = $str:literal,)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $default_str)]
            $default,
            $(#[serde(rename = $str)] $variant,)*
        }

        impl $name {
            /// Stored string form.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::$default => $default_str,
                    $(Self::$variant => $str,)*
                }
            }

            /// Parse a stored string; anything unknown yields the default.
            #[must_use]
            pub fn from_stored(value: &str) -> Self {
                match value.trim() {
                    $($str => Self::$variant,)*
                    _ => Self::default(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum! {
    /// What makes a box appear.
    TriggerKind {
        #[default] Percentage = "percentage",
        Element = "element",
    }
}

option_enum! {
    /// Entrance animation.
    Animation {
        #[default] Fade = "fade",
        Slide = "slide",
    }
}

option_enum! {
    /// Screen corner (or center) the box is anchored to.
    Position {
        #[default] BottomRight = "bottom-right",
        BottomLeft = "bottom-left",
        TopRight = "top-right",
        TopLeft = "top-left",
        Center = "center",
    }
}

/// Presentation settings of a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssOptions {
    /// Anchor position.
    pub position: Position,
    /// Maximum width in pixels, 0 = `auto`.
    pub width: u32,
    /// Background color, never empty.
    pub background_color: String,
    /// Text color.
    pub color: Option<String>,
    /// Border color; only used together with a non-zero `border_width`.
    pub border_color: Option<String>,
    /// Border width in pixels.
    pub border_width: u32,
}

impl CssOptions {
    /// The effective border as `(width, color)`, if both parts are set.
    #[must_use]
    pub fn border(&self) -> Option<(u32, &str)> {
        match &self.border_color {
            Some(color) if self.border_width > 0 => Some((self.border_width, color)),
            _ => None,
        }
    }
}

impl Default for CssOptions {
    fn default() -> Self {
        Self {
            position: Position::default(),
            width: 0,
            background_color: DEFAULT_BACKGROUND.to_string(),
            color: None,
            border_color: None,
            border_width: 0,
        }
    }
}

/// Fully typed options of one box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOptions {
    /// Trigger kind.
    pub trigger: TriggerKind,
    /// Scroll percentage for [`TriggerKind::Percentage`].
    pub trigger_percentage: u32,
    /// Selector for [`TriggerKind::Element`].
    pub trigger_element: String,
    /// Entrance animation.
    pub animation: Animation,
    /// Days to stay hidden after dismissal.
    pub cookie_days: u32,
    /// Ignore the dismissal cookie.
    pub test_mode: bool,
    /// Hide again when scrolling back up.
    pub auto_hide: bool,
    /// Presentation.
    pub css: CssOptions,
    /// Explicit screen width below which the box hides. `None` when the
    /// stored value is missing or empty.
    pub screen_size_override: Option<u32>,
    /// Effective hide threshold in pixels, 0 = never hide.
    pub minimum_screen_width: u32,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            trigger: TriggerKind::default(),
            trigger_percentage: DEFAULT_TRIGGER_PERCENTAGE,
            trigger_element: String::new(),
            animation: Animation::default(),
            cookie_days: 0,
            test_mode: false,
            auto_hide: false,
            css: CssOptions::default(),
            screen_size_override: None,
            minimum_screen_width: 0,
        }
    }
}

impl ResolvedOptions {
    /// Project back into the stored representation.
    ///
    /// Resolving the result again yields `self`.
    #[must_use]
    pub fn to_raw(&self) -> RawOptions {
        let mut css = Map::new();
        css.insert("position".into(), self.css.position.as_str().into());
        css.insert("width".into(), self.css.width.into());
        css.insert(
            "background_color".into(),
            self.css.background_color.clone().into(),
        );
        css.insert(
            "color".into(),
            self.css.color.clone().unwrap_or_default().into(),
        );
        css.insert(
            "border_color".into(),
            self.css.border_color.clone().unwrap_or_default().into(),
        );
        css.insert("border_width".into(), self.css.border_width.into());

        let mut raw = Map::new();
        raw.insert("trigger".into(), self.trigger.as_str().into());
        raw.insert("trigger_percentage".into(), self.trigger_percentage.into());
        raw.insert("trigger_element".into(), self.trigger_element.clone().into());
        raw.insert("animation".into(), self.animation.as_str().into());
        raw.insert("cookie".into(), self.cookie_days.into());
        raw.insert("test_mode".into(), self.test_mode.into());
        raw.insert("auto_hide".into(), self.auto_hide.into());
        raw.insert(
            "hide_on_screen_size".into(),
            self.screen_size_override
                .map_or_else(|| Value::from(""), Value::from),
        );
        raw.insert("css".into(), Value::Object(css));
        raw
    }
}

/// Turns [`RawOptions`] into [`ResolvedOptions`].
///
/// The only external input is the auto-hide-small-screens preference: the
/// global setting, passed through the `auto_hide_small_screens` hook.
#[derive(Debug, Clone, Copy)]
pub struct OptionsResolver<'a> {
    auto_hide_small_screens: bool,
    hooks: &'a Hooks,
}

impl<'a> OptionsResolver<'a> {
    /// Create a resolver from site settings and hooks.
    #[must_use]
    pub fn new(settings: &Settings, hooks: &'a Hooks) -> Self {
        Self {
            auto_hide_small_screens: settings.auto_hide_small_screens,
            hooks,
        }
    }

    /// Resolve the stored options of `box_id`.
    #[must_use]
    pub fn resolve(&self, box_id: BoxId, raw: &RawOptions) -> ResolvedOptions {
        let empty = Map::new();
        let css = match raw.get("css") {
            Some(Value::Object(css)) => css,
            _ => &empty,
        };

        let css = CssOptions {
            position: css
                .get("position")
                .and_then(Value::as_str)
                .map_or_else(Position::default, Position::from_stored),
            width: coerce_u32(css.get("width")),
            background_color: non_empty_string(css.get("background_color"))
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
            color: non_empty_string(css.get("color")),
            border_color: non_empty_string(css.get("border_color")),
            border_width: coerce_u32(css.get("border_width")),
        };

        let screen_size_override = match raw.get("hide_on_screen_size") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            value => Some(coerce_u32(value)),
        };

        let minimum_screen_width = match screen_size_override {
            None if self
                .hooks
                .auto_hide_small_screens(self.auto_hide_small_screens, box_id) =>
            {
                css.width
            }
            Some(size) if size > 0 => size,
            _ => 0,
        };

        ResolvedOptions {
            trigger: raw
                .get("trigger")
                .and_then(Value::as_str)
                .map_or_else(TriggerKind::default, TriggerKind::from_stored),
            trigger_percentage: raw
                .get("trigger_percentage")
                .map_or(DEFAULT_TRIGGER_PERCENTAGE, |v| coerce_u32(Some(v))),
            trigger_element: raw
                .get("trigger_element")
                .map(value_to_string)
                .unwrap_or_default(),
            animation: raw
                .get("animation")
                .and_then(Value::as_str)
                .map_or_else(Animation::default, Animation::from_stored),
            cookie_days: coerce_u32(raw.get("cookie")),
            test_mode: raw.get("test_mode").is_some_and(truthy),
            auto_hide: raw.get("auto_hide").is_some_and(truthy),
            css,
            screen_size_override,
            minimum_screen_width,
        }
    }
}

/// Coerce a stored value to a non-negative integer. Missing, negative and
/// unparseable values become 0.
///
/// ```
/// use serde_json::json;
/// use stb::options::coerce_u32;
///
/// assert_eq!(coerce_u32(Some(&json!("480px"))), 480);
/// assert_eq!(coerce_u32(Some(&json!(-5))), 0);
/// assert_eq!(coerce_u32(Some(&json!("abc"))), 0);
/// assert_eq!(coerce_u32(None), 0);
/// ```
#[must_use]
pub fn coerce_u32(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).unwrap_or(u32::MAX)
            } else if let Some(f) = n.as_f64() {
                if f >= 1.0 {
                    // Truncation is the intent; `as` saturates.
                    f.trunc() as u32
                } else {
                    0
                }
            } else {
                0
            }
        }
        Some(Value::String(s)) => leading_integer(s),
        Some(Value::Bool(b)) => u32::from(*b),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> u32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end]
        .bytes()
        .fold(0u32, |acc, b| acc.saturating_mul(10).saturating_add(u32::from(b - b'0')))
}

/// Loose truthiness of a stored value.
///
/// ```
/// use serde_json::json;
/// use stb::options::truthy;
///
/// assert!(truthy(&json!("1")));
/// assert!(truthy(&json!("no")));
/// assert!(!truthy(&json!("0")));
/// assert!(!truthy(&json!([])));
/// ```
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A string for values that are truthy and not blank; `"0"`, `0`, `false`,
/// null and empty collections count as absent.
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .filter(|v| truthy(v))
        .map(value_to_string)
        .filter(|s| !s.trim().is_empty())
}
