//! Client-side bookmark search.
//!
//! Matching is a case-insensitive substring test over title and URL. The
//! term is used as typed; an empty term matches everything.

use crate::models::Bookmark;

/// Return the bookmarks whose title or URL contains `term`, in input order.
#[must_use]
pub fn filter_bookmarks<'a>(bookmarks: &'a [Bookmark], term: &str) -> Vec<&'a Bookmark> {
    let needle = term.to_lowercase();
    bookmarks
        .iter()
        .filter(|bookmark| bookmark_matches(bookmark, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn bookmark_matches(bookmark: &Bookmark, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    bookmark.title.to_lowercase().contains(needle) || bookmark.url.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::models::BookmarkId;

    fn bookmark(title: &str, url: &str) -> Bookmark {
        Bookmark {
            id: BookmarkId::from_uuid(Uuid::new_v4()),
            url: url.to_string(),
            title: title.to_string(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            user_id: "user".to_string(),
        }
    }

    fn titles(bookmarks: &[&Bookmark]) -> Vec<String> {
        bookmarks.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn empty_term_returns_everything() {
        let bookmarks = vec![
            bookmark("Rust Docs", "https://docs.rs"),
            bookmark("News", "https://news.ycombinator.com"),
        ];
        assert_eq!(filter_bookmarks(&bookmarks, "").len(), 2);
    }

    #[test]
    fn matches_title_or_url_case_insensitively() {
        let bookmarks = vec![
            bookmark("Rust Docs", "https://docs.rs"),
            bookmark("Crates", "https://CRATES.io"),
            bookmark("Weather", "https://example.com/forecast"),
        ];

        assert_eq!(titles(&filter_bookmarks(&bookmarks, "RUST")), vec!["Rust Docs"]);
        assert_eq!(titles(&filter_bookmarks(&bookmarks, "crates.IO")), vec!["Crates"]);
        assert_eq!(
            titles(&filter_bookmarks(&bookmarks, "https://")),
            vec!["Rust Docs", "Crates", "Weather"]
        );
    }

    #[test]
    fn preserves_order_and_drops_non_matches() {
        let bookmarks = vec![
            bookmark("b docs", "https://b.example"),
            bookmark("unrelated", "https://c.example"),
            bookmark("a docs", "https://a.example"),
        ];
        assert_eq!(
            titles(&filter_bookmarks(&bookmarks, "docs")),
            vec!["b docs", "a docs"]
        );
        assert!(filter_bookmarks(&bookmarks, "missing").is_empty());
    }

    #[test]
    fn term_is_not_trimmed() {
        let bookmarks = vec![
            bookmark("Two words", "https://a.example"),
            bookmark("Oneword", "https://b.example"),
        ];
        assert_eq!(titles(&filter_bookmarks(&bookmarks, " ")), vec!["Two words"]);
    }
}
