//! Lifecycle of a single long-poll request.
//!
//! A session registers with the broker and then waits for the first of three
//! triggers: a delivered batch, the timeout, or the client going away. The
//! delivered batch travels through a `oneshot` channel, which can be completed
//! at most once, and the three triggers are raced in a single `select!`, so
//! the session resolves exactly once.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, Instant};

use super::broker::{MessageBroker, Subscription};
use crate::models::message::Message;

/// How a session ended when it produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The broker handed over a non-empty batch.
    Delivered(Vec<Message>),
    /// Nothing arrived before the deadline.
    TimedOut,
}

/// One suspended long-poll request.
pub struct LongPoll {
    subscription: SubscriptionGuard,
    batch: oneshot::Receiver<Vec<Message>>,
    deadline: Instant,
}

impl LongPoll {
    /// Subscribe to `broker` and start the timeout clock.
    ///
    /// If messages are already pending they are moved into this session
    /// immediately and [`LongPoll::resolve`] returns without waiting.
    pub fn start(broker: &MessageBroker, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();

        tracing::debug!("long poll: subscribe started");
        let subscription = broker.subscribe(move |batch| {
            // The receiver is gone only if the session already resolved; the
            // batch is dropped with it.
            let _ = tx.send(batch);
        });

        Self {
            subscription: SubscriptionGuard(Some(subscription)),
            batch: rx,
            deadline,
        }
    }

    /// Wait for a delivery or the timeout.
    ///
    /// Client disconnects are handled by dropping this future, which
    /// withdraws the subscription.
    pub async fn resolve(self) -> Resolution {
        let connected = std::future::pending::<()>();
        self.resolve_until(connected)
            .await
            .unwrap_or(Resolution::TimedOut)
    }

    /// Wait for a delivery, the timeout, or `disconnected` to complete.
    ///
    /// Returns `None` when the disconnect won: no response must be written
    /// and the subscription has been withdrawn, so a later publish will not
    /// reach this session.
    pub async fn resolve_until<D>(mut self, disconnected: D) -> Option<Resolution>
    where
        D: Future<Output = ()>,
    {
        tokio::select! {
            biased;

            batch = &mut self.batch => {
                self.subscription.disarm();
                match batch {
                    Ok(batch) => {
                        tracing::info!(count = batch.len(), "long poll: delivering new messages");
                        Some(Resolution::Delivered(batch))
                    }
                    // The waiter was dropped without running, which only
                    // happens if it was withdrawn; answer as if nothing came.
                    Err(_) => Some(Resolution::TimedOut),
                }
            }

            _ = time::sleep_until(self.deadline) => {
                if self.subscription.cancel() {
                    tracing::info!("long poll: timeout reached, sending empty response");
                    return Some(Resolution::TimedOut);
                }
                // Lost the race to a publish that already took this waiter;
                // the batch is in the channel or about to be.
                match self.batch.await {
                    Ok(batch) => {
                        tracing::info!(count = batch.len(), "long poll: delivering new messages at deadline");
                        Some(Resolution::Delivered(batch))
                    }
                    Err(_) => Some(Resolution::TimedOut),
                }
            }

            _ = disconnected => {
                self.subscription.cancel();
                tracing::info!("long poll: client closed connection");
                None
            }
        }
    }
}

/// Withdraws the broker subscription when the session is dropped unresolved,
/// e.g. when the HTTP connection closes and the handler future is cancelled.
struct SubscriptionGuard(Option<Subscription>);

impl SubscriptionGuard {
    fn cancel(&mut self) -> bool {
        self.0.take().is_some_and(|sub| sub.cancel())
    }

    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if self.cancel() {
            tracing::info!("long poll: client closed connection");
        }
    }
}
