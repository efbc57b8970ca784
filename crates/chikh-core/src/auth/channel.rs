//! Publish/subscribe channel for session transitions.
//!
//! Every subscriber gets its own unbounded queue, so transitions are
//! delivered one at a time and in the order they were published. Dropping
//! or unsubscribing a `Subscription` removes its queue under the same lock
//! that publishing takes, so nothing is delivered to it afterwards.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::trace;

use super::Session;

struct ChannelState {
    session: Session,
    subscribers: HashMap<u64, mpsc::UnboundedSender<Session>>,
    next_id: u64,
}

fn lock(state: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    // Session snapshots are replaced wholesale, so a poisoned lock still
    // holds a consistent value.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holder of the current session plus its subscriber registry.
///
/// Only the owner can publish; everyone else reads snapshots or subscribes.
pub struct SessionChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl SessionChannel {
    pub fn new(initial: Session) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                session: initial,
                subscribers: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Snapshot of the latest published session
    pub fn current(&self) -> Session {
        lock(&self.state).session.clone()
    }

    /// Register a subscriber for all future transitions.
    ///
    /// The snapshot returned by `Subscription::initial` is taken under the
    /// same lock as the registration, so no transition can fall between them.
    pub fn subscribe(&self) -> Subscription {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.insert(id, tx);
        trace!(subscription = id, "Session subscriber added");

        Subscription {
            id,
            initial: state.session.clone(),
            rx,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Replace the session and deliver it to every live subscriber.
    /// Returns the number of subscribers it was delivered to.
    pub(crate) fn publish(&self, session: Session) -> usize {
        let mut state = lock(&self.state);
        state.session = session.clone();
        state
            .subscribers
            .retain(|_, tx| tx.send(session.clone()).is_ok());
        state.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }
}

/// A live registration on a `SessionChannel`.
///
/// Also usable as a `Stream` of sessions.
pub struct Subscription {
    id: u64,
    initial: Session,
    rx: mpsc::UnboundedReceiver<Session>,
    state: Weak<Mutex<ChannelState>>,
}

impl Subscription {
    /// Session as it was when this subscription was registered
    pub fn initial(&self) -> &Session {
        &self.initial
    }

    /// Wait for the next transition.
    /// Returns `None` once the owning channel has been dropped.
    pub async fn next(&mut self) -> Option<Session> {
        self.rx.recv().await
    }

    /// Tear the subscription down. No further transitions are delivered.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).subscribers.remove(&self.id);
            trace!(subscription = self.id, "Session subscriber removed");
        }
        self.rx.close();
    }
}

impl Stream for Subscription {
    type Item = Session;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Session>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
