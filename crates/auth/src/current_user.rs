//! Observable holder of the signed-in user.

use std::sync::{Arc, Mutex, RwLock, mpsc};
use std::time::Duration;

use crate::user::User;

#[derive(Debug, Default)]
struct Inner {
    value: RwLock<Option<User>>,
    subscribers: Mutex<Vec<mpsc::Sender<Option<User>>>>,
}

/// Current-user cell with broadcast of every transition.
///
/// - No IO / no async
/// - Subscribers see each `set`/`clear` in order, including the transition
///   to no user
/// - Dropped subscriptions are pruned on the next publish
///
/// Cheap to clone; clones share the cell.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    inner: Arc<Inner>,
}

impl CurrentUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<User> {
        match self.inner.value.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, user: User) {
        self.publish(Some(user));
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    /// Subscribe to future transitions (the current value is not replayed).
    pub fn subscribe(&self) -> UserSubscription {
        let (tx, rx) = mpsc::channel();

        match self.inner.subscribers.lock() {
            Ok(mut subs) => subs.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }

        UserSubscription { rx }
    }

    fn publish(&self, next: Option<User>) {
        // Held across the store and the fan-out so that concurrent publishers
        // broadcast in the same order their values are stored.
        let mut subs = match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match self.inner.value.write() {
            Ok(mut guard) => *guard = next.clone(),
            Err(poisoned) => *poisoned.into_inner() = next.clone(),
        }

        subs.retain(|tx| tx.send(next.clone()).is_ok());
    }
}

/// Receiving end of a [`CurrentUser`] subscription.
#[derive(Debug)]
pub struct UserSubscription {
    rx: mpsc::Receiver<Option<User>>,
}

impl UserSubscription {
    /// Next pending transition, if one has already been published.
    pub fn try_next(&self) -> Option<Option<User>> {
        self.rx.try_recv().ok()
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<Option<User>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// All transitions published so far and not yet consumed.
    pub fn drain(&self) -> Vec<Option<User>> {
        self.rx.try_iter().collect()
    }
}
