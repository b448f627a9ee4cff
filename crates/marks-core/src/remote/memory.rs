//! In-process remote used by tests and offline runs.
//!
//! Rows are scoped to the signed-in user on select, mirroring row-level
//! security, while change events go out for every row like the hosted feed.
//! Every call is recorded and each operation can be told to fail.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::{BookmarkStore, ChangeFeed, SessionSource};
use crate::auth::AuthSession;
use crate::config::{DEFAULT_SCHEMA, DEFAULT_TABLE};
use crate::models::{Bookmark, BookmarkId, NewBookmark};
use crate::realtime::{ChangeEvent, ChangeFilter, ChangeKind, LocalChangeFeed, Subscription};
use crate::{Error, Result};

const CLOCK_START: i64 = 1_700_000_000;

/// One recorded call against the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetSession,
    SignOut,
    Select,
    Insert(NewBookmark),
    Delete(BookmarkId),
    Subscribe(ChangeFilter),
}

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Session,
    SignOut,
    Select,
    Insert,
    Delete,
    Subscribe,
}

#[derive(Default)]
struct FailureFlags {
    session: AtomicBool,
    sign_out: AtomicBool,
    select: AtomicBool,
    insert: AtomicBool,
    delete: AtomicBool,
    subscribe: AtomicBool,
}

impl FailureFlags {
    const fn flag(&self, failure: Failure) -> &AtomicBool {
        match failure {
            Failure::Session => &self.session,
            Failure::SignOut => &self.sign_out,
            Failure::Select => &self.select,
            Failure::Insert => &self.insert,
            Failure::Delete => &self.delete,
            Failure::Subscribe => &self.subscribe,
        }
    }
}

pub struct MemoryRemote {
    session: Mutex<Option<AuthSession>>,
    rows: Mutex<Vec<Bookmark>>,
    calls: Mutex<Vec<RemoteCall>>,
    feed: LocalChangeFeed,
    failures: FailureFlags,
    clock: AtomicI64,
}

impl MemoryRemote {
    pub fn new(session: Option<AuthSession>) -> Self {
        Self {
            session: Mutex::new(session),
            rows: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            feed: LocalChangeFeed::new(),
            failures: FailureFlags::default(),
            clock: AtomicI64::new(CLOCK_START),
        }
    }

    pub fn fail(&self, failure: Failure, enabled: bool) {
        self.failures.flag(failure).store(enabled, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(call)).count()
    }

    pub fn select_count(&self) -> usize {
        self.count_calls(|call| matches!(call, RemoteCall::Select))
    }

    pub const fn feed(&self) -> &LocalChangeFeed {
        &self.feed
    }

    pub fn session(&self) -> Option<AuthSession> {
        lock(&self.session).clone()
    }

    /// Insert a row as if another session (possibly another user) wrote it.
    pub fn insert_external(&self, record: &NewBookmark) -> Bookmark {
        self.store_row(record)
    }

    /// Remove a row as if another session deleted it.
    pub fn delete_external(&self, id: &BookmarkId) -> bool {
        self.remove_row(id)
    }

    /// Push an arbitrary event into the feed.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        self.feed.publish(event)
    }

    fn record(&self, call: RemoteCall) {
        lock(&self.calls).push(call);
    }

    fn check(&self, failure: Failure) -> Result<()> {
        if self.failures.flag(failure).load(Ordering::SeqCst) {
            Err(Error::Api(format!("injected {failure:?} failure")))
        } else {
            Ok(())
        }
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let seconds = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(seconds, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn store_row(&self, record: &NewBookmark) -> Bookmark {
        let bookmark = Bookmark {
            id: BookmarkId::from_uuid(Uuid::new_v4()),
            url: record.url.clone(),
            title: record.title.clone(),
            created_at: self.next_timestamp(),
            user_id: record.user_id.clone(),
        };
        lock(&self.rows).push(bookmark.clone());
        self.feed.publish(&row_event(
            ChangeKind::Insert,
            serde_json::json!({"record": &bookmark}),
        ));
        bookmark
    }

    fn remove_row(&self, id: &BookmarkId) -> bool {
        let removed = {
            let mut rows = lock(&self.rows);
            let before = rows.len();
            rows.retain(|row| row.id != *id);
            before != rows.len()
        };
        if removed {
            self.feed.publish(&row_event(
                ChangeKind::Delete,
                serde_json::json!({"old_record": {"id": id}}),
            ));
        }
        removed
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SessionSource for MemoryRemote {
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        self.record(RemoteCall::GetSession);
        self.check(Failure::Session)?;
        Ok(self.session())
    }

    async fn sign_out(&self) -> Result<()> {
        self.record(RemoteCall::SignOut);
        self.check(Failure::SignOut)?;
        *lock(&self.session) = None;
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for MemoryRemote {
    fn change_filter(&self) -> ChangeFilter {
        ChangeFilter::all(DEFAULT_SCHEMA, DEFAULT_TABLE)
    }

    async fn select(&self) -> Result<Vec<Bookmark>> {
        self.record(RemoteCall::Select);
        self.check(Failure::Select)?;
        let owner = self.session().map(|session| session.user.id);

        let mut rows = lock(&self.rows)
            .iter()
            .filter(|row| owner.as_deref() == Some(row.user_id.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, record: &NewBookmark) -> Result<Bookmark> {
        self.record(RemoteCall::Insert(record.clone()));
        self.check(Failure::Insert)?;
        Ok(self.store_row(record))
    }

    async fn delete(&self, id: &BookmarkId) -> Result<()> {
        self.record(RemoteCall::Delete(*id));
        self.check(Failure::Delete)?;
        self.remove_row(id);
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for MemoryRemote {
    async fn subscribe(&self, filter: &ChangeFilter) -> Result<Subscription> {
        self.record(RemoteCall::Subscribe(filter.clone()));
        self.check(Failure::Subscribe)?;
        self.feed.subscribe(filter).await
    }
}

fn row_event(kind: ChangeKind, payload: serde_json::Value) -> ChangeEvent {
    ChangeEvent {
        event: kind,
        schema: DEFAULT_SCHEMA.to_string(),
        table: DEFAULT_TABLE.to_string(),
        payload,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
