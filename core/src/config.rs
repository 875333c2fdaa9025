//! Settings and site files.
//!
//! A site file bundles global [`Settings`] with every box: its post fields,
//! raw options, and display rules. It deserializes from YAML or JSON and
//! feeds [`MemoryStore`](crate::MemoryStore).
//!
//! ```yaml
//! settings:
//!   auto_hide_small_screens: false
//! boxes:
//!   - id: 12
//!     title: Newsletter
//!     content: "Sign up!\n\n[signup_form]"
//!     options:
//!       trigger: percentage
//!       trigger_percentage: 50
//!       css: { width: 400, position: bottom-left }
//!     rules:
//!       - { condition: is_page, value: "5, contact" }
//!       - { condition: manual, value: "is_single() && !is_user_logged_in()" }
//! ```

use crate::{BoxId, BoxPost, ConfigError, PostStatus, RawOptions, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Engine version, printed in the markup comments.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Global, site-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the script variable the payload is assigned to.
    pub script_var: String,
    /// Hide boxes on screens narrower than the box, unless the box sets an
    /// explicit threshold.
    pub auto_hide_small_screens: bool,
    /// Markup of the close affordance before the `close_icon` hook.
    pub close_icon: String,
    /// Version printed in the markup comments.
    pub version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script_var: "STB_Options".to_string(),
            auto_hide_small_screens: true,
            close_icon: "&times;".to_string(),
            version: VERSION.to_string(),
        }
    }
}

/// One box as stored in a site file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Unique id.
    pub id: BoxId,
    /// Publication state, `publish` when omitted.
    #[serde(default)]
    pub status: PostStatus,
    /// Admin-facing title.
    #[serde(default)]
    pub title: String,
    /// Raw content.
    #[serde(default)]
    pub content: String,
    /// Untyped options, resolved at request time.
    #[serde(default)]
    pub options: RawOptions,
    /// Display rules, evaluated in order.
    #[serde(default)]
    pub rules: RuleSet,
}

impl BoxRecord {
    /// The post part of the record.
    #[must_use]
    pub fn post(&self) -> BoxPost {
        BoxPost {
            id: self.id,
            status: self.status.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// Settings plus all boxes of a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,
    /// Boxes in stored order.
    #[serde(default)]
    pub boxes: Vec<BoxRecord>,
}

impl SiteConfig {
    /// Load a site file. `.json` files are parsed as JSON, anything else
    /// as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not parse,
    /// or declares the same box id twice.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse a site from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on parse failure and
    /// [`ConfigError::DuplicateBox`] on a repeated id.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let site: Self = serde_yaml::from_str(yaml)?;
        site.validate()
    }

    /// Parse a site from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on parse failure and
    /// [`ConfigError::DuplicateBox`] on a repeated id.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let site: Self = serde_json::from_str(json)?;
        site.validate()
    }

    /// Look up a box by id.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&BoxRecord> {
        self.boxes.iter().find(|b| b.id == id)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(self.boxes.len());
        for record in &self.boxes {
            if !seen.insert(record.id) {
                return Err(ConfigError::DuplicateBox(record.id.get()));
            }
        }
        Ok(self)
    }
}
