use std::sync::Arc;

use chrono::{TimeZone, Utc};
use marks_core::auth::{AuthSession, AuthUser};
use marks_core::remote::{Failure, MemoryRemote, RemoteCall};
use marks_core::{Bookmark, BookmarkId, NewBookmark, ViewEvent};
use pretty_assertions::assert_eq;

use crate::cli::CompletionShell;
use crate::commands::add::add_bookmark;
use crate::commands::common::{
    bookmark_to_list_item, format_bookmark_lines, format_relative_time, mount_with,
    normalize_bookmark_identifier, resolve_bookmark_id, short_id, truncate,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{merge_profile, missing_fields, validate_profile, ProfileInput};
use crate::commands::delete::delete_bookmark;
use crate::commands::search::search_bookmarks;
use crate::commands::watch::{needs_render, render_frame};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

const USER: &str = "cli-user";

fn signed_in_remote() -> Arc<MemoryRemote> {
    Arc::new(MemoryRemote::new(Some(AuthSession {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: i64::MAX,
        user: AuthUser {
            id: USER.to_string(),
            email: Some("me@example.com".to_string()),
        },
    })))
}

fn bookmark(id: &str, title: &str, url: &str, created_secs: i64) -> Bookmark {
    Bookmark {
        id: id.parse().unwrap(),
        url: url.to_string(),
        title: title.to_string(),
        created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
        user_id: USER.to_string(),
    }
}

#[test]
fn format_relative_time_units() {
    let created = Utc.timestamp_opt(10_000, 0).unwrap();
    let now = created.timestamp_millis();
    assert_eq!(format_relative_time(created, now + 30_000), "just now");
    assert_eq!(format_relative_time(created, now + 120_000), "2m ago");
    assert_eq!(format_relative_time(created, now + 2 * 60 * 60_000), "2h ago");
    assert_eq!(
        format_relative_time(created, now + 3 * 24 * 60 * 60_000),
        "3d ago"
    );
}

#[test]
fn truncate_collapses_whitespace_and_adds_ellipsis() {
    assert_eq!(truncate("  short   title ", 20), "short title");
    assert_eq!(
        truncate("This is a very long sentence that should be shortened", 20),
        "This is a very lo..."
    );
}

#[test]
fn bookmark_lines_show_short_id_title_time_and_url() {
    let bookmarks = vec![bookmark(
        "11111111-1111-4111-8111-111111111111",
        "Rust docs",
        "https://docs.rs",
        1_700_000_000,
    )];
    let now_ms = bookmarks[0].created_at.timestamp_millis() + 5 * 60_000;

    let lines = format_bookmark_lines(&bookmarks, now_ms);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("11111111  Rust docs"));
    assert!(lines[0].contains("5m ago"));
    assert!(lines[0].ends_with("https://docs.rs"));
}

#[test]
fn list_item_serializes_full_id_and_timestamp() {
    let item = bookmark_to_list_item(
        &bookmark(
            "11111111-1111-4111-8111-111111111111",
            "Rust docs",
            "https://docs.rs",
            0,
        ),
        0,
    );
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], "11111111-1111-4111-8111-111111111111");
    assert_eq!(json["created_at"], "1970-01-01T00:00:00+00:00");
    assert_eq!(json["relative_time"], "just now");
}

#[test]
fn normalize_bookmark_identifier_rejects_empty() {
    assert!(matches!(
        normalize_bookmark_identifier(" \n "),
        Err(CliError::EmptyBookmarkId)
    ));
    assert_eq!(normalize_bookmark_identifier("  abc123  ").unwrap(), "abc123");
}

#[test]
fn resolve_bookmark_id_supports_exact_and_prefix() {
    let bookmarks = vec![
        bookmark("11111111-1111-4111-8111-111111111111", "A", "https://a", 1),
        bookmark("22222222-2222-4222-8222-222222222222", "B", "https://b", 2),
    ];

    let exact = resolve_bookmark_id("11111111-1111-4111-8111-111111111111", &bookmarks).unwrap();
    assert_eq!(exact, bookmarks[0].id);
    assert_eq!(resolve_bookmark_id("2222", &bookmarks).unwrap(), bookmarks[1].id);
}

#[test]
fn resolve_bookmark_id_reports_missing_and_ambiguous_prefixes() {
    let bookmarks = vec![
        bookmark("aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa", "Left", "https://l", 1),
        bookmark("aaaaaaaa-bbbb-4bbb-8bbb-bbbbbbbbbbbb", "Right", "https://r", 2),
    ];

    assert!(matches!(
        resolve_bookmark_id("ffff", &bookmarks),
        Err(CliError::BookmarkNotFound(_))
    ));
    match resolve_bookmark_id("AAAA", &bookmarks) {
        Err(CliError::AmbiguousBookmarkId(message)) => {
            assert!(message.contains("aaaaaaaa"));
        }
        other => panic!("expected ambiguous prefix, got {other:?}"),
    }
}

#[test]
fn short_id_keeps_first_segment() {
    let id: BookmarkId = "12345678-1111-4111-8111-111111111111".parse().unwrap();
    assert_eq!(short_id(&id), "12345678");
}

#[test]
fn merge_profile_prefers_flags_then_env_then_existing() {
    let existing = CliProfile {
        supabase_url: Some("https://old.supabase.co".to_string()),
        supabase_anon_key: Some("old-key".to_string()),
        table: Some("links".to_string()),
        realtime_channel: None,
    };

    let merged = merge_profile(
        &existing,
        ProfileInput {
            supabase_url: Some("https://new.supabase.co".to_string()),
            realtime_channel: Some(" links_changes ".to_string()),
            ..ProfileInput::default()
        },
        Some("https://env.supabase.co".to_string()),
        Some("env-key".to_string()),
    );

    assert_eq!(
        merged,
        CliProfile {
            supabase_url: Some("https://new.supabase.co".to_string()),
            supabase_anon_key: Some("env-key".to_string()),
            table: Some("links".to_string()),
            realtime_channel: Some("links_changes".to_string()),
        }
    );
    assert!(missing_fields(&merged).is_empty());
}

#[test]
fn validate_profile_requires_http_scheme() {
    let profile = CliProfile {
        supabase_url: Some("project.supabase.co".to_string()),
        ..CliProfile::default()
    };
    assert!(validate_profile(&profile).is_err());
    assert_eq!(
        missing_fields(&CliProfile::default()),
        vec!["supabase_url", "supabase_anon_key"]
    );
}

#[test]
fn completions_name_the_marks_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("marks"));
    assert!(!render_completions(CompletionShell::Fish).is_empty());
    let zsh = String::from_utf8(render_completions(CompletionShell::Zsh)).unwrap();
    assert!(zsh.starts_with("#compdef marks"));
}

#[test]
fn only_list_changes_trigger_a_redraw() {
    assert!(needs_render(ViewEvent::Reconciled { count: 1 }));
    assert!(needs_render(ViewEvent::SearchTermChanged));
    assert!(!needs_render(ViewEvent::AddingChanged(true)));
    assert!(!needs_render(ViewEvent::DraftChanged));
    assert!(!needs_render(ViewEvent::FeedClosed));
}

#[tokio::test(flavor = "current_thread")]
async fn signed_out_profile_is_told_to_log_in() {
    let remote = Arc::new(MemoryRemote::new(None));

    let result = mount_with(Arc::clone(&remote)).await;

    assert!(matches!(result, Err(CliError::NotSignedIn)));
    assert_eq!(remote.calls(), vec![RemoteCall::GetSession]);
}

#[tokio::test(flavor = "current_thread")]
async fn add_returns_new_id_and_rejects_blank_fields() {
    let remote = signed_in_remote();
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();
    let controller = dashboard.controller();

    let id = add_bookmark(controller, "Docs", "docs.rs").await.unwrap();
    let state = controller.snapshot();
    assert_eq!(state.bookmarks.len(), 1);
    assert_eq!(state.bookmarks[0].id, id);
    assert_eq!(state.bookmarks[0].url, "https://docs.rs");

    assert!(matches!(
        add_bookmark(controller, "", "docs.rs").await,
        Err(CliError::MissingBookmarkFields)
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn add_failure_surfaces_as_error() {
    let remote = signed_in_remote();
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();
    remote.fail(Failure::Insert, true);

    let result = add_bookmark(dashboard.controller(), "Docs", "docs.rs").await;

    assert!(matches!(result, Err(CliError::Core(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn search_filters_loaded_bookmarks_case_insensitively() {
    let remote = signed_in_remote();
    remote.insert_external(&NewBookmark::new("Rust Book", "doc.rust-lang.org/book", USER));
    remote.insert_external(&NewBookmark::new("Crates", "CRATES.io", USER));
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();

    let matches = search_bookmarks(dashboard.controller(), "crates");

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].title, "Crates");
    assert_eq!(search_bookmarks(dashboard.controller(), "").len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn delete_resolves_prefix_and_sends_delete() {
    let remote = signed_in_remote();
    let saved = remote.insert_external(&NewBookmark::new("Docs", "docs.rs", USER));
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();

    let prefix = short_id(&saved.id);
    let id = delete_bookmark(dashboard.controller(), &prefix).await.unwrap();

    assert_eq!(id, saved.id);
    assert!(remote.calls().contains(&RemoteCall::Delete(saved.id)));
}

#[tokio::test(flavor = "current_thread")]
async fn delete_failure_is_not_an_error() {
    let remote = signed_in_remote();
    let saved = remote.insert_external(&NewBookmark::new("Docs", "docs.rs", USER));
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();
    remote.fail(Failure::Delete, true);

    let id = delete_bookmark(dashboard.controller(), &saved.id.to_string())
        .await
        .unwrap();

    assert_eq!(id, saved.id);
}

#[tokio::test(flavor = "current_thread")]
async fn watch_frame_reflects_search_term() {
    let remote = signed_in_remote();
    remote.insert_external(&NewBookmark::new("Rust Book", "doc.rust-lang.org/book", USER));
    remote.insert_external(&NewBookmark::new("Crates", "crates.io", USER));
    let dashboard = mount_with(Arc::clone(&remote)).await.unwrap();
    let controller = dashboard.controller();
    let now_ms = Utc::now().timestamp_millis();

    let frame = render_frame(controller, now_ms);
    assert_eq!(frame[0], "me@example.com - 2 bookmarks");
    assert_eq!(frame.len(), 3);

    controller.set_search_term("nothing-matches");
    let frame = render_frame(controller, now_ms);
    assert_eq!(
        frame,
        vec![
            "me@example.com - 0 of 2 bookmarks matching 'nothing-matches'".to_string(),
            "No bookmarks found.".to_string(),
        ]
    );
}
