//! Real-time delivery over HTTP long polling.

pub mod broker;
pub mod session;

pub use broker::{MessageBroker, PublishOutcome, Subscription};
pub use session::{LongPoll, Resolution};
