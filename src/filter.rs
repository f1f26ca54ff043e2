use std::time::Duration;

use tokio::sync::oneshot;

use crate::{Message, Result};

/// Identifies a filter within a single `MessageManager`'s registry.
pub type FilterId = u64;

/// The default one-shot wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// A registered intent to send zero or one outbound frame and to consume
/// matching inbound frames via a predicate.
///
/// A `Filter` is either one-shot (has a completion waiter and removes
/// itself after the first match) or a persistent subscription (no
/// completion, never self-removes). The two constructors below are the only
/// ways to build one, so that invariant is structural rather than asserted
/// at runtime.
pub struct Filter {
    pub(crate) message_to_send: Option<Message>,
    pub(crate) consume: Box<dyn FnMut(&Message) -> bool + Send>,
    pub(crate) delete_after_first_consumed: bool,
    pub(crate) expected_max_response_wait: Option<Duration>,
    pub(crate) completion: Option<oneshot::Sender<Result<Message>>>,
}

impl Filter {
    /// A request/response filter: sends `message_to_send` once, removes
    /// itself and fulfils its completion the first time `predicate` matches.
    pub fn one_shot(
        message_to_send: Option<Message>,
        predicate: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> (Self, oneshot::Receiver<Result<Message>>) {
        let (sender, receiver) = oneshot::channel();
        let filter = Self {
            message_to_send,
            consume: Box::new(predicate),
            delete_after_first_consumed: true,
            expected_max_response_wait: Some(DEFAULT_TIMEOUT),
            completion: Some(sender),
        };
        (filter, receiver)
    }

    /// A persistent filter serving a subscription or the peak watcher: no
    /// timeout, never self-removes, and its predicate is expected to push
    /// results out via a channel or callback as a side effect of matching.
    pub fn subscription(
        message_to_send: Option<Message>,
        predicate: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> Self {
        Self {
            message_to_send,
            consume: Box::new(predicate),
            delete_after_first_consumed: false,
            expected_max_response_wait: None,
            completion: None,
        }
    }

    /// Overrides the default 15s deadline. Has no effect on subscriptions.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if self.completion.is_some() {
            self.expected_max_response_wait = Some(timeout);
        }
        self
    }
}
