//! Data models for Smart Bookmark

mod bookmark;

pub use bookmark::{normalize_bookmark_url, Bookmark, BookmarkDraft, BookmarkId, NewBookmark};
