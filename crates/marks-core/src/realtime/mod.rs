//! Change notifications for the bookmark table.
//!
//! A [`Subscription`] delivers [`ChangeEvent`]s until it is dropped; dropping it
//! (or just its [`SubscriptionGuard`]) unsubscribes from the feed.

mod client;
mod local;
pub mod protocol;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use client::RealtimeFeed;
pub use local::LocalChangeFeed;

/// Row mutation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which mutation kinds a subscription wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventMask {
    #[default]
    All,
    Only(ChangeKind),
}

impl EventMask {
    /// Wire form used by postgres_changes bindings (`*`, `INSERT`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Only(ChangeKind::Insert) => "INSERT",
            Self::Only(ChangeKind::Update) => "UPDATE",
            Self::Only(ChangeKind::Delete) => "DELETE",
        }
    }

    pub fn accepts(self, kind: ChangeKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == kind,
        }
    }
}

/// Subscription scope: one table, any owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub event: EventMask,
    pub schema: String,
    pub table: String,
}

impl ChangeFilter {
    pub fn all(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            event: EventMask::All,
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.event.accepts(event.event) && self.schema == event.schema && self.table == event.table
    }
}

/// A single row mutation reported by the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub event: ChangeKind,
    pub schema: String,
    pub table: String,
    pub payload: serde_json::Value,
}

/// Releases a subscription exactly once, on drop.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubscriptionGuard")
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Live stream of change events plus its release guard
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    guard: SubscriptionGuard,
}

impl Subscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            events,
            guard: SubscriptionGuard::new(release),
        }
    }

    /// Next change, or `None` once the feed side is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Split so the guard can be owned apart from whoever drains events.
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<ChangeEvent>, SubscriptionGuard) {
        (self.events, self.guard)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn event(kind: ChangeKind, table: &str) -> ChangeEvent {
        ChangeEvent {
            event: kind,
            schema: "public".to_string(),
            table: table.to_string(),
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn filter_matches_table_and_mask() {
        let all = ChangeFilter::all("public", "bookmarks");
        assert!(all.matches(&event(ChangeKind::Delete, "bookmarks")));
        assert!(!all.matches(&event(ChangeKind::Insert, "profiles")));

        let inserts = ChangeFilter {
            event: EventMask::Only(ChangeKind::Insert),
            ..all
        };
        assert!(inserts.matches(&event(ChangeKind::Insert, "bookmarks")));
        assert!(!inserts.matches(&event(ChangeKind::Update, "bookmarks")));
    }

    #[test]
    fn event_mask_wire_names() {
        assert_eq!(EventMask::All.as_str(), "*");
        assert_eq!(EventMask::Only(ChangeKind::Delete).as_str(), "DELETE");
    }

    #[test]
    fn guard_releases_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let (_tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (_events, guard) = subscription.into_parts();
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
