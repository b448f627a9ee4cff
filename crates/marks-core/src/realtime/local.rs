//! In-process change feed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChangeEvent, ChangeFilter, Subscription};
use crate::remote::ChangeFeed;
use crate::Result;

struct Subscriber {
    id: u64,
    filter: ChangeFilter,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Fans published events out to every matching subscriber.
#[derive(Clone, Default)]
pub struct LocalChangeFeed {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_id: Arc<AtomicU64>,
}

impl LocalChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to matching subscribers; returns how many received it.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| !subscriber.sender.is_closed());
        subscribers
            .iter()
            .filter(|subscriber| subscriber.filter.matches(event))
            .filter(|subscriber| subscriber.sender.send(event.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn register(&self, filter: &ChangeFilter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                id,
                filter: filter.clone(),
                sender,
            });

        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(receiver, move || {
            subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|subscriber| subscriber.id != id);
            tracing::debug!(subscription = id, "Local change subscription released");
        })
    }
}

#[async_trait]
impl ChangeFeed for LocalChangeFeed {
    async fn subscribe(&self, filter: &ChangeFilter) -> Result<Subscription> {
        Ok(self.register(filter))
    }
}
