//! Box identity and the read-only content snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, unique identifier of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(pub u64);

impl BoxId {
    /// The raw numeric id.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BoxId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Publication state of a box.
///
/// Only [`PostStatus::Publish`] boxes are ever rendered. Statuses this crate
/// does not know about are kept verbatim and treated as unpublished.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    /// Live.
    #[default]
    Publish,
    /// Work in progress.
    Draft,
    /// Awaiting review.
    Pending,
    /// Visible to editors only.
    Private,
    /// In the bin.
    Trash,
    /// Anything else the store reports.
    Other(String),
}

impl PostStatus {
    /// Convert to the stored string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Trash => "trash",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for [`PostStatus::Publish`].
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl From<String> for PostStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "publish" => Self::Publish,
            "draft" => Self::Draft,
            "pending" => Self::Pending,
            "private" => Self::Private,
            "trash" => Self::Trash,
            _ => Self::Other(s),
        }
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A box as the content store hands it out: identity, status and raw content.
///
/// Options are fetched separately and resolved by
/// [`OptionsResolver`](crate::OptionsResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxPost {
    /// Unique id.
    pub id: BoxId,
    /// Publication state.
    #[serde(default)]
    pub status: PostStatus,
    /// Admin-facing title.
    #[serde(default)]
    pub title: String,
    /// Raw content template, before the content filter chain.
    #[serde(default)]
    pub content: String,
}

impl BoxPost {
    /// Create a published box with the given content.
    pub fn new(id: impl Into<BoxId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: PostStatus::Publish,
            title: String::new(),
            content: content.into(),
        }
    }

    /// Set the status (builder pattern).
    #[must_use]
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns `true` if the box may be rendered.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }
}
