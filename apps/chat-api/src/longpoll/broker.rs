//! In-process mailbox matching published messages to waiting long-poll
//! requests.
//!
//! The broker holds two pieces of state behind one lock: a pending batch of
//! messages published while nobody was waiting, and the set of waiters
//! registered while nothing was pending. Every operation leaves at most one
//! of the two non-empty.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::message::Message;

type Waiter = Box<dyn FnOnce(Vec<Message>) + Send>;

#[derive(Default)]
struct State {
    pending: Vec<Message>,
    waiters: HashMap<u64, Waiter>,
    next_waiter_id: u64,
}

impl State {
    fn check_exclusive(&self) {
        debug_assert!(
            self.pending.is_empty() || self.waiters.is_empty(),
            "broker holds both pending messages and waiters"
        );
    }
}

/// What `publish` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Handed to this many waiters, which are now gone from the wait set.
    Delivered(usize),
    /// Nobody was waiting; the pending batch now holds this many messages.
    Buffered(usize),
}

/// Shared pub/sub mailbox. Construct one per process and share it through
/// `AppState`.
#[derive(Default)]
pub struct MessageBroker {
    state: Arc<Mutex<State>>,
}

impl MessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `on_deliver` to receive the next non-empty batch.
    ///
    /// If messages are already pending, the callback runs before this method
    /// returns with the whole buffer, the buffer is cleared, and the returned
    /// subscription is already settled. Otherwise the callback is queued until
    /// the next `publish` or until the subscription is cancelled. Either way
    /// the callback runs at most once.
    pub fn subscribe<F>(&self, on_deliver: F) -> Subscription
    where
        F: FnOnce(Vec<Message>) + Send + 'static,
    {
        let mut state = self.state.lock();

        if !state.pending.is_empty() {
            let batch = std::mem::take(&mut state.pending);
            state.check_exclusive();
            drop(state);

            tracing::debug!(count = batch.len(), "broker: draining pending batch to new subscriber");
            on_deliver(batch);
            return Subscription::settled();
        }

        let id = state.next_waiter_id;
        state.next_waiter_id += 1;
        state.waiters.insert(id, Box::new(on_deliver));
        state.check_exclusive();

        Subscription {
            id: Some(id),
            state: Arc::clone(&self.state),
        }
    }

    /// Deliver `message` to every current waiter, or buffer it when there
    /// are none.
    ///
    /// Waiters are removed before any callback runs, so a message published
    /// from inside a callback is buffered for the next subscriber rather than
    /// reaching a waiter twice.
    pub fn publish(&self, message: Message) -> PublishOutcome {
        let waiters = {
            let mut state = self.state.lock();
            if state.waiters.is_empty() {
                state.pending.push(message);
                state.check_exclusive();
                return PublishOutcome::Buffered(state.pending.len());
            }
            let waiters = std::mem::take(&mut state.waiters);
            state.check_exclusive();
            waiters
        };

        let count = waiters.len();
        for (_, deliver) in waiters {
            deliver(vec![message.clone()]);
        }
        PublishOutcome::Delivered(count)
    }

    /// Number of subscribers currently waiting.
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Number of messages buffered for the next subscriber.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }
}

/// Handle returned by [`MessageBroker::subscribe`].
///
/// Dropping it does not cancel; call [`Subscription::cancel`].
pub struct Subscription {
    /// `None` when the subscriber was served synchronously and never queued.
    id: Option<u64>,
    state: Arc<Mutex<State>>,
}

impl Subscription {
    fn settled() -> Self {
        Self {
            id: None,
            state: Arc::default(),
        }
    }

    /// Withdraw the waiter if it has not been served yet.
    ///
    /// Returns `true` if this call removed it, in which case its callback
    /// will never run. Returns `false` if delivery already happened (or is
    /// in progress) or the subscription was already cancelled; other waiters
    /// are never affected.
    pub fn cancel(&self) -> bool {
        match self.id {
            Some(id) => self.state.lock().waiters.remove(&id).is_some(),
            None => false,
        }
    }
}
