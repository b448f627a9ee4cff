//! Bookmark view controller.
//!
//! [`BookmarkController::mount`] gates on the current session, loads the
//! signed-in user's bookmarks and keeps them in step with the remote table by
//! re-fetching on every change notification. The resulting [`Dashboard`] owns
//! the change subscription; dropping it (or signing out) releases it.
//!
//! The local list is only ever a projection of the remote store. Every
//! reconciliation is a full replace, so an action's own follow-up fetch and a
//! notification-triggered fetch may race; whichever response lands last wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::auth::AuthUser;
use crate::models::{Bookmark, BookmarkDraft, BookmarkId, NewBookmark};
use crate::realtime::{ChangeKind, SubscriptionGuard};
use crate::remote::RemoteClient;
use crate::search::filter_bookmarks;
use crate::Result;

const EVENT_CAPACITY: usize = 64;

/// Everything a presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub bookmarks: Vec<Bookmark>,
    pub search_term: String,
    pub loading: bool,
    pub adding: bool,
    pub draft: BookmarkDraft,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            bookmarks: Vec::new(),
            search_term: String::new(),
            loading: true,
            adding: false,
            draft: BookmarkDraft::default(),
        }
    }
}

impl ViewState {
    /// Bookmarks matching the current search term, in list order.
    pub fn filtered(&self) -> Vec<&Bookmark> {
        filter_bookmarks(&self.bookmarks, &self.search_term)
    }
}

/// Published whenever the view state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// The list was replaced by a fresh fetch.
    Reconciled { count: usize },
    /// A fetch failed; the previous list is still shown.
    FetchFailed,
    /// A change notification arrived and a fetch is under way.
    ChangeReceived(ChangeKind),
    /// The change feed ended; the list no longer updates on its own.
    FeedClosed,
    AddingChanged(bool),
    DraftChanged,
    SearchTermChanged,
}

/// Result of an add request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Title or URL was empty; nothing was sent.
    Skipped,
    Added(BookmarkId),
}

/// Where the caller should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Login,
}

/// Outcome of mounting the bookmark view
pub enum Mount<C: RemoteClient> {
    RedirectToLogin,
    Ready(Dashboard<C>),
}

impl<C: RemoteClient> Mount<C> {
    pub fn into_dashboard(self) -> Option<Dashboard<C>> {
        match self {
            Self::Ready(dashboard) => Some(dashboard),
            Self::RedirectToLogin => None,
        }
    }
}

struct Inner<C> {
    client: Arc<C>,
    user: AuthUser,
    state: Mutex<ViewState>,
    events: broadcast::Sender<ViewEvent>,
}

/// Cheap, cloneable handle over the bookmark view.
pub struct BookmarkController<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for BookmarkController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: RemoteClient> BookmarkController<C> {
    /// Resolve the session and, when signed in, start listening and load.
    ///
    /// The subscription is opened before the initial fetch so a write that
    /// lands in between still triggers a reconcile. A missing session (or a
    /// failed lookup) redirects to login without touching the bookmark table
    /// or the change feed.
    pub async fn mount(client: Arc<C>) -> Mount<C> {
        let session = match client.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                info!("No active session, redirecting to login");
                return Mount::RedirectToLogin;
            }
            Err(error) => {
                warn!(%error, "Session lookup failed, redirecting to login");
                return Mount::RedirectToLogin;
            }
        };

        let controller = Self::new(client, session.user);
        let listener = controller.listen().await;
        controller.fetch_bookmarks().await;

        Mount::Ready(Dashboard {
            controller,
            listener,
        })
    }

    fn new(client: Arc<C>, user: AuthUser) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                client,
                user,
                state: Mutex::new(ViewState::default()),
                events,
            }),
        }
    }

    /// Replace the list with the store's current rows, newest first.
    ///
    /// Failures keep the previous list. `loading` is cleared either way.
    pub async fn fetch_bookmarks(&self) {
        let result = self.inner.client.select().await;

        let event = {
            let mut state = self.state();
            state.loading = false;
            match result {
                Ok(bookmarks) => {
                    let count = bookmarks.len();
                    state.bookmarks = bookmarks;
                    ViewEvent::Reconciled { count }
                }
                Err(error) => {
                    warn!(%error, "Failed to fetch bookmarks");
                    ViewEvent::FetchFailed
                }
            }
        };
        self.emit(event);
    }

    /// Insert a bookmark for the signed-in user, then reconcile.
    ///
    /// Empty input is ignored. On failure the draft keeps its values and the
    /// error is returned for display.
    pub async fn add_bookmark(&self, title: &str, url: &str) -> Result<AddOutcome> {
        if title.is_empty() || url.is_empty() {
            return Ok(AddOutcome::Skipped);
        }

        let record = NewBookmark::new(title, url, self.inner.user.id.clone());
        self.set_adding(true);
        let outcome = match self.inner.client.insert(&record).await {
            Ok(bookmark) => {
                debug!(id = %bookmark.id, "Bookmark added");
                self.update_draft(BookmarkDraft::clear);
                self.fetch_bookmarks().await;
                Ok(AddOutcome::Added(bookmark.id))
            }
            Err(err) => {
                error!(error = %err, "Failed to add bookmark");
                Err(err)
            }
        };
        self.set_adding(false);
        outcome
    }

    /// Submit the add form with its current values.
    pub async fn submit_draft(&self) -> Result<AddOutcome> {
        let draft = self.state().draft.clone();
        self.add_bookmark(&draft.title, &draft.url).await
    }

    /// Request removal by id. The list changes only once the feed reports it.
    pub async fn delete_bookmark(&self, id: &BookmarkId) {
        if let Err(error) = self.inner.client.delete(id).await {
            warn!(%error, %id, "Failed to delete bookmark");
        }
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.state().search_term = term.into();
        self.emit(ViewEvent::SearchTermChanged);
    }

    pub fn set_draft_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update_draft(|draft| draft.title = title);
    }

    pub fn set_draft_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.update_draft(|draft| draft.url = url);
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    /// Owned copy of the bookmarks matching the search term.
    pub fn filtered(&self) -> Vec<Bookmark> {
        self.state().filtered().into_iter().cloned().collect()
    }

    pub fn user(&self) -> &AuthUser {
        &self.inner.user
    }

    pub fn events(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.events.subscribe()
    }

    async fn listen(&self) -> Option<Listener> {
        let filter = self.inner.client.change_filter();
        let subscription = match self.inner.client.subscribe(&filter).await {
            Ok(subscription) => subscription,
            Err(error) => {
                warn!(%error, table = %filter.table, "Realtime subscription failed");
                return None;
            }
        };

        let (mut changes, guard) = subscription.into_parts();
        let controller = self.clone();
        let task = tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                debug!(kind = ?change.event, table = %change.table, "Change received");
                controller.emit(ViewEvent::ChangeReceived(change.event));
                controller.fetch_bookmarks().await;
            }
            warn!("Change feed closed");
            controller.emit(ViewEvent::FeedClosed);
        });

        Some(Listener {
            task,
            _guard: guard,
        })
    }

    fn set_adding(&self, adding: bool) {
        self.state().adding = adding;
        self.emit(ViewEvent::AddingChanged(adding));
    }

    fn update_draft(&self, update: impl FnOnce(&mut BookmarkDraft)) {
        update(&mut self.state().draft);
        self.emit(ViewEvent::DraftChanged);
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ViewEvent) {
        // No receivers is fine; nobody is rendering.
        let _ = self.inner.events.send(event);
    }
}

/// Background task draining the change feed
struct Listener {
    task: JoinHandle<()>,
    _guard: SubscriptionGuard,
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A mounted bookmark view. Holds the change subscription for its lifetime.
pub struct Dashboard<C: RemoteClient> {
    controller: BookmarkController<C>,
    listener: Option<Listener>,
}

impl<C: RemoteClient> Dashboard<C> {
    pub const fn controller(&self) -> &BookmarkController<C> {
        &self.controller
    }

    pub fn events(&self) -> broadcast::Receiver<ViewEvent> {
        self.controller.events()
    }

    /// Whether change notifications are still being received.
    pub fn is_live(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.task.is_finished())
    }

    /// End the session and unmount. Always navigates to login.
    pub async fn sign_out(self) -> Navigation {
        if let Err(error) = self.controller.inner.client.sign_out().await {
            warn!(%error, "Sign out failed");
        }
        drop(self);
        Navigation::Login
    }
}
