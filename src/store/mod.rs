//! Global store: one writer, many snapshot readers.
//!
//! Every mutation goes through [`Store::dispatch`], which applies a
//! [`StoreAction`] under a mutex and publishes the result as a fresh
//! `Arc<GlobalState>`. Readers hold on to whatever snapshot they took and never
//! observe a half-applied step.

pub mod action;
mod reducer;
pub mod state;

use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

pub use action::StoreAction;
pub use state::*;

pub type Listener = Arc<dyn Fn(&Arc<GlobalState>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct StoreInner {
    snapshot: Arc<GlobalState>,
    revision: u64,
    next_subscription: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

pub struct Store {
    inner: Mutex<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Store")
            .field("revision", &inner.revision)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(GlobalState::default())
    }
}

impl Store {
    pub fn new(initial: GlobalState) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                snapshot: Arc::new(initial),
                revision: 0,
                next_subscription: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// The latest published state.
    pub fn snapshot(&self) -> Arc<GlobalState> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&inner.snapshot)
    }

    /// Number of applied steps that changed the state.
    pub fn revision(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    /// Applies `action` and notifies subscribers if anything changed.
    pub fn dispatch(&self, action: StoreAction) -> bool {
        trace!("dispatch {action:?}");
        let (snapshot, listeners) = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = (*inner.snapshot).clone();
            if !next.apply(action) {
                return false;
            }
            inner.snapshot = Arc::new(next);
            inner.revision += 1;
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (Arc::clone(&inner.snapshot), listeners)
        };
        // Listeners run unlocked so they may dispatch follow-up actions.
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<GlobalState>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.listeners.len();
        inner.listeners.retain(|(sid, _)| *sid != id);
        inner.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn snapshots_are_immutable_once_taken() {
        let store = Store::default();
        let before = store.snapshot();
        assert!(store.dispatch(StoreAction::SetSpreadMode(SpreadMode::Odd)));
        let after = store.snapshot();

        assert_eq!(before.plugins.spread.spread_mode, SpreadMode::None);
        assert_eq!(after.plugins.spread.spread_mode, SpreadMode::Odd);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn unchanged_steps_do_not_notify() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.dispatch(StoreAction::SetSpreadMode(SpreadMode::None)));
        assert!(store.dispatch(StoreAction::SetFullscreen(true)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn listeners_may_dispatch_follow_ups() {
        let store = Arc::new(Store::default());
        let inner = Arc::clone(&store);
        store.subscribe(move |state| {
            if state.plugins.fullscreen.is_fullscreen {
                inner.dispatch(StoreAction::SetScrolling(true));
            }
        });

        store.dispatch(StoreAction::SetFullscreen(true));
        assert!(store.snapshot().plugins.viewport.is_scrolling);
    }

    #[test]
    fn unsubscribed_listeners_are_dropped() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(StoreAction::SetFullscreen(true));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
