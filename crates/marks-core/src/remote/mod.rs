//! Contracts for the hosted backend the bookmark view talks to.
//!
//! [`RemoteClient`] bundles session access, table CRUD and the change feed.
//! [`SupabaseRemote`] implements it against a Supabase project and
//! [`MemoryRemote`] keeps everything in process.

pub mod memory;
pub mod postgrest;
pub mod supabase;

use async_trait::async_trait;

use crate::auth::AuthSession;
use crate::models::{Bookmark, BookmarkId, NewBookmark};
use crate::realtime::{ChangeFilter, Subscription};
use crate::Result;

pub use memory::{Failure, MemoryRemote, RemoteCall};
pub use postgrest::PostgrestBookmarkStore;
pub use supabase::SupabaseRemote;

#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Current session, `None` when signed out.
    async fn get_session(&self) -> Result<Option<AuthSession>>;

    /// Invalidate the current session.
    async fn sign_out(&self) -> Result<()>;
}

/// Bookmark table access; rows are scoped to the session owner server side.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Changes that concern this store's table.
    fn change_filter(&self) -> ChangeFilter;

    /// Every row visible to the session, newest `created_at` first.
    async fn select(&self) -> Result<Vec<Bookmark>>;

    async fn insert(&self, record: &NewBookmark) -> Result<Bookmark>;

    async fn delete(&self, id: &BookmarkId) -> Result<()>;
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, filter: &ChangeFilter) -> Result<Subscription>;
}

pub trait RemoteClient: SessionSource + BookmarkStore + ChangeFeed + 'static {}

impl<T> RemoteClient for T where T: SessionSource + BookmarkStore + ChangeFeed + 'static {}
