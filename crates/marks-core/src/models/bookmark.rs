//! Bookmark model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned bookmark identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(Uuid);

impl BookmarkId {
    /// Wrap an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookmarkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A bookmark row as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Unique identifier
    pub id: BookmarkId,
    /// Absolute URL
    pub url: String,
    /// Display title
    pub title: String,
    /// Creation timestamp, newest first when listed
    pub created_at: DateTime<Utc>,
    /// Owner reference
    pub user_id: String,
}

/// Insert payload for a new bookmark row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub user_id: String,
}

impl NewBookmark {
    /// Build an insert payload, normalizing the URL scheme.
    #[must_use]
    pub fn new(title: impl Into<String>, url: &str, user_id: impl Into<String>) -> Self {
        Self {
            url: normalize_bookmark_url(url),
            title: title.into(),
            user_id: user_id.into(),
        }
    }
}

/// Unsubmitted add-form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
}

impl BookmarkDraft {
    pub fn clear(&mut self) {
        self.title.clear();
        self.url.clear();
    }
}

/// Prefix `https://` to URLs that do not already start with `http`.
///
/// # Examples
///
/// ```
/// use marks_core::models::normalize_bookmark_url;
///
/// assert_eq!(normalize_bookmark_url("docs.rs"), "https://docs.rs");
/// assert_eq!(normalize_bookmark_url("http://x.com"), "http://x.com");
/// ```
#[must_use]
pub fn normalize_bookmark_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
