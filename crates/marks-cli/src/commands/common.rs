use std::sync::Arc;

use chrono::{DateTime, Utc};
use marks_core::remote::{RemoteClient, SupabaseRemote};
use marks_core::{Bookmark, BookmarkController, BookmarkId, Dashboard, Mount};
use serde::Serialize;

use crate::auth::SessionStore;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

const SHORT_ID_LEN: usize = 8;
const TITLE_WIDTH: usize = 32;

pub type CliRemote = SupabaseRemote<SessionStore>;

#[derive(Debug, Serialize)]
pub struct BookmarkListItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_at: String,
    pub relative_time: String,
}

/// Resolve the profile and build its Supabase client.
pub fn open_remote(global_profile: Option<&str>) -> Result<(String, CliRemote), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let remote_config = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .remote_config()
        .map_err(CliError::Config)?
        .ok_or_else(|| CliError::NotConfigured(profile_name.clone()))?;

    let remote = SupabaseRemote::new(remote_config, SessionStore::new(&profile_name))?;
    Ok((profile_name, remote))
}

pub async fn mount_dashboard(global_profile: Option<&str>) -> Result<Dashboard<CliRemote>, CliError> {
    let (_, remote) = open_remote(global_profile)?;
    mount_with(Arc::new(remote)).await
}

/// Mount the bookmark view; a login redirect becomes [`CliError::NotSignedIn`].
pub async fn mount_with<C: RemoteClient>(client: Arc<C>) -> Result<Dashboard<C>, CliError> {
    match BookmarkController::mount(client).await {
        Mount::Ready(dashboard) => Ok(dashboard),
        Mount::RedirectToLogin => Err(CliError::NotSignedIn),
    }
}

/// Match a full id or a unique id prefix against the fetched bookmarks.
pub fn resolve_bookmark_id(query: &str, bookmarks: &[Bookmark]) -> Result<BookmarkId, CliError> {
    let query = normalize_bookmark_identifier(query)?;
    if let Ok(id) = query.parse::<BookmarkId>() {
        return Ok(id);
    }

    let needle = query.to_lowercase();
    let matches = bookmarks
        .iter()
        .filter(|bookmark| bookmark.id.to_string().starts_with(&needle))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::BookmarkNotFound(query)),
        [bookmark] => Ok(bookmark.id),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|bookmark| short_id(&bookmark.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousBookmarkId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_bookmark_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyBookmarkId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn print_bookmarks(bookmarks: &[Bookmark], limit: usize, as_json: bool) -> Result<(), CliError> {
    let shown = &bookmarks[..bookmarks.len().min(limit)];
    let now_ms = Utc::now().timestamp_millis();

    if as_json {
        let json_items = shown
            .iter()
            .map(|bookmark| bookmark_to_list_item(bookmark, now_ms))
            .collect::<Vec<BookmarkListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if shown.is_empty() {
        println!("No bookmarks yet.");
    } else {
        for line in format_bookmark_lines(shown, now_ms) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn format_bookmark_lines(bookmarks: &[Bookmark], now_ms: i64) -> Vec<String> {
    bookmarks
        .iter()
        .map(|bookmark| {
            let short_id = short_id(&bookmark.id);
            let title = truncate(&bookmark.title, TITLE_WIDTH);
            let relative_time = format_relative_time(bookmark.created_at, now_ms);
            format!(
                "{short_id:<8}  {title:<32}  {relative_time:<10}  {}",
                bookmark.url
            )
        })
        .collect()
}

pub fn bookmark_to_list_item(bookmark: &Bookmark, now_ms: i64) -> BookmarkListItem {
    BookmarkListItem {
        id: bookmark.id.to_string(),
        title: bookmark.title.clone(),
        url: bookmark.url.clone(),
        created_at: bookmark.created_at.to_rfc3339(),
        relative_time: format_relative_time(bookmark.created_at, now_ms),
    }
}

pub fn short_id(id: &BookmarkId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(created_at: DateTime<Utc>, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(created_at.timestamp_millis());
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
