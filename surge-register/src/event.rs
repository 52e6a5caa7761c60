use crate::{RouteEvent, RouteListener};
use dashmap::DashMap;
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};
use tracing::error;

type Listeners = DashMap<u64, Arc<dyn RouteListener>>;

/// Fan-out of [`RouteEvent`]s for registry backends.
#[derive(Default)]
pub struct RouteEventBus {
    listeners: Arc<Listeners>,
    next_id: AtomicU64,
}

impl RouteEventBus {
    pub fn subscribe(&self, listener: Arc<dyn RouteListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Delivers `event` to every listener. A panicking listener is logged and
    /// skipped so the others still observe the event.
    pub fn publish(&self, event: &RouteEvent) {
        // snapshot first, listeners may unsubscribe from inside the callback
        let listeners: Vec<(u64, Arc<dyn RouteListener>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener.on_event(event))).is_err() {
                error!("route listener {id} panicked while handling {event:?}");
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Handle returned by [`RouteManager::subscribe`](crate::RouteManager::subscribe).
#[must_use = "dropping a Subscription detaches the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(&self.id);
        }
    }
}
