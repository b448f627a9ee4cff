use std::io::{self, IsTerminal, Write};

use chrono::Utc;
use marks_core::remote::RemoteClient;
use marks_core::{BookmarkController, ViewEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::commands::common::{format_bookmark_lines, mount_dashboard};
use crate::error::CliError;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn run_watch(search: Option<String>, global_profile: Option<&str>) -> Result<(), CliError> {
    let dashboard = mount_dashboard(global_profile).await?;
    let controller = dashboard.controller().clone();
    if let Some(term) = search {
        controller.set_search_term(term);
    }
    if !dashboard.is_live() {
        warn!("Realtime updates unavailable; showing a static list");
    }

    let mut events = dashboard.events();
    let clear = io::stdout().is_terminal();
    render(&controller, clear)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ViewEvent::FeedClosed) => warn!("Realtime updates stopped; the list is now static"),
                Ok(event) if needs_render(event) => render(&controller, clear)?,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => render(&controller, clear)?,
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(dashboard);
    println!("Stopped watching.");
    Ok(())
}

pub const fn needs_render(event: ViewEvent) -> bool {
    matches!(
        event,
        ViewEvent::Reconciled { .. } | ViewEvent::FetchFailed | ViewEvent::SearchTermChanged
    )
}

/// Full frame for the current view state.
pub fn render_frame<C: RemoteClient>(controller: &BookmarkController<C>, now_ms: i64) -> Vec<String> {
    let state = controller.snapshot();
    let filtered = state
        .filtered()
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();

    let mut lines = Vec::with_capacity(filtered.len() + 2);
    let email = controller.user().email.as_deref().unwrap_or("(no email)");
    if state.search_term.is_empty() {
        lines.push(format!("{email} - {} bookmarks", state.bookmarks.len()));
    } else {
        lines.push(format!(
            "{email} - {} of {} bookmarks matching '{}'",
            filtered.len(),
            state.bookmarks.len(),
            state.search_term
        ));
    }

    if state.loading {
        lines.push("Loading...".to_string());
    } else if filtered.is_empty() {
        lines.push("No bookmarks found.".to_string());
    } else {
        lines.extend(format_bookmark_lines(&filtered, now_ms));
    }
    lines
}

fn render<C: RemoteClient>(controller: &BookmarkController<C>, clear: bool) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    if clear {
        write!(stdout, "{CLEAR_SCREEN}")?;
    }
    for line in render_frame(controller, Utc::now().timestamp_millis()) {
        writeln!(stdout, "{line}")?;
    }
    writeln!(stdout, "Watching for changes. Press Ctrl-C to stop.")?;
    stdout.flush()?;
    Ok(())
}
