//! [`RemoteClient`](super::RemoteClient) backed by a Supabase project.

use async_trait::async_trait;

use super::{BookmarkStore, ChangeFeed, PostgrestBookmarkStore, SessionSource};
use crate::auth::{AuthSession, SessionPersistence, SupabaseAuthClient};
use crate::config::RemoteConfig;
use crate::models::{Bookmark, BookmarkId, NewBookmark};
use crate::realtime::{ChangeFilter, RealtimeFeed, Subscription};
use crate::{Error, Result};

/// GoTrue auth + PostgREST table + Realtime feed for one project.
pub struct SupabaseRemote<S: SessionPersistence> {
    config: RemoteConfig,
    auth: SupabaseAuthClient<S>,
    rest: PostgrestBookmarkStore,
    realtime: RealtimeFeed,
}

impl<S: SessionPersistence> SupabaseRemote<S> {
    pub fn new(config: RemoteConfig, store: S) -> Result<Self> {
        let auth = SupabaseAuthClient::new(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            store,
        )?;
        let rest = PostgrestBookmarkStore::new(&config)?;
        let realtime = RealtimeFeed::new(&config);

        Ok(Self {
            config,
            auth,
            rest,
            realtime,
        })
    }

    pub const fn auth(&self) -> &SupabaseAuthClient<S> {
        &self.auth
    }

    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn access_token(&self) -> Result<String> {
        self.auth
            .restore_session()
            .await?
            .map(|session| session.access_token)
            .ok_or(Error::NotSignedIn)
    }
}

#[async_trait]
impl<S: SessionPersistence> SessionSource for SupabaseRemote<S> {
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.auth.restore_session().await?)
    }

    /// The local session is forgotten even when the server call fails.
    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.auth.stored_session()? else {
            return Ok(());
        };

        if let Err(error) = self.auth.sign_out(&session.access_token).await {
            self.auth.forget_session()?;
            return Err(error.into());
        }
        Ok(())
    }
}

#[async_trait]
impl<S: SessionPersistence> BookmarkStore for SupabaseRemote<S> {
    fn change_filter(&self) -> ChangeFilter {
        ChangeFilter::all(&self.config.schema, &self.config.table)
    }

    async fn select(&self) -> Result<Vec<Bookmark>> {
        let token = self.access_token().await?;
        self.rest.select(&token).await
    }

    async fn insert(&self, record: &NewBookmark) -> Result<Bookmark> {
        let token = self.access_token().await?;
        self.rest.insert(&token, record).await
    }

    async fn delete(&self, id: &BookmarkId) -> Result<()> {
        let token = self.access_token().await?;
        self.rest.delete(&token, id).await
    }
}

#[async_trait]
impl<S: SessionPersistence> ChangeFeed for SupabaseRemote<S> {
    async fn subscribe(&self, filter: &ChangeFilter) -> Result<Subscription> {
        let token = self.access_token().await.ok();
        self.realtime.subscribe(filter, token.as_deref()).await
    }
}
