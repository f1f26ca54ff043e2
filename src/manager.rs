use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use indexmap::IndexMap;
use tokio::sync::{mpsc, Mutex};

use crate::{
    BincodeCodec, Codec, Error, Filter, FilterId, Message, MessageChannel, NewPeakWallet,
    ProtocolMessageTypes, Result,
};

/// Sentinel for "no peak observed yet" in `MessageManagerInner::peak_height`.
const NO_PEAK: u64 = u64::MAX;

struct Registry {
    filters: IndexMap<FilterId, Filter>,
    next_id: FilterId,
    closed: bool,
}

impl Registry {
    fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            next_id: 0,
            closed: false,
        }
    }
}

struct MessageManagerInner {
    channel: Arc<dyn MessageChannel>,
    registry: Mutex<Registry>,
    // Kept outside the registry mutex, per the design notes: the peak
    // watcher's predicate updates this while `dispatch` already holds the
    // registry lock, so this has to be independently lock-free.
    peak_height: AtomicU64,
}

/// Owns the channel, the filter registry, the peak-height watcher, the
/// timeout scheduler and the connection lifecycle.
///
/// Responses carry no correlation id, so dispatch works by running every
/// installed filter's predicate against each inbound frame, in insertion
/// order, until one consumes it. Grounded on the overall shape of
/// `chia_client::Client`/`Peer` (an `Arc`-wrapped, `Clone`-able handle with a
/// spawned inbound-forwarding task), but replacing their id-keyed
/// `RequestMap` with this predicate-based registry.
#[derive(Clone)]
pub struct MessageManager(Arc<MessageManagerInner>);

impl MessageManager {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self(Arc::new(MessageManagerInner {
            channel,
            registry: Mutex::new(Registry::new()),
            peak_height: AtomicU64::new(NO_PEAK),
        }))
    }

    /// Opens the channel and installs the permanent peak watcher.
    pub async fn initialize(&self) -> Result<()> {
        let (sender, mut receiver) = mpsc::channel::<Bytes>(256);
        self.0.channel.on_message(sender);
        self.0.channel.open().await?;

        let watcher = self.clone();
        let peak_filter = Filter::subscription(None, move |message: &Message| {
            if message.msg_type != ProtocolMessageTypes::NewPeakWallet {
                return false;
            }
            match BincodeCodec::decode::<NewPeakWallet>(&message.data) {
                Ok(peak) => {
                    watcher.0.peak_height.store(u64::from(peak.height), Ordering::SeqCst);
                    log::debug!("Peak height updated to {}", peak.height);
                }
                Err(error) => {
                    log::warn!(
                        "Failed to decode NewPeakWallet, keeping previous peak height: {error}"
                    );
                }
            }
            true
        });
        self.install(peak_filter).await?;

        let dispatcher = self.clone();
        tokio::spawn(async move {
            while let Some(bytes) = receiver.recv().await {
                match BincodeCodec::decode::<Message>(&bytes) {
                    Ok(message) => dispatcher.dispatch(message).await,
                    Err(error) => log::warn!("Dropping unparseable inbound frame: {error}"),
                }
            }
            log::info!("Inbound channel closed, closing message manager");
            dispatcher.close().await;
        });

        Ok(())
    }

    /// Registers `filter`, sending its outbound message (if any) exactly
    /// once. For one-shot filters, pair this with the `oneshot::Receiver`
    /// returned by `Filter::one_shot` to await the match.
    pub async fn register_filter(&self, filter: Filter) -> Result<()> {
        {
            let registry = self.0.registry.lock().await;
            if registry.closed {
                return Err(Error::NotConnected);
            }
        }
        self.install(filter).await
    }

    async fn install(&self, mut filter: Filter) -> Result<()> {
        let message_to_send = filter.message_to_send.take();
        let timeout = filter.expected_max_response_wait;

        let filter_id = {
            let mut registry = self.0.registry.lock().await;
            let filter_id = registry.next_id;
            registry.next_id += 1;
            registry.filters.insert(filter_id, filter);
            filter_id
        };

        if let Some(message) = message_to_send {
            if let Err(error) = self.0.channel.send(BincodeCodec::encode(&message)?).await {
                let mut registry = self.0.registry.lock().await;
                if let Some(mut removed) = registry.filters.shift_remove(&filter_id) {
                    if let Some(completion) = removed.completion.take() {
                        let _ = completion.send(Err(Error::Transport(error.to_string())));
                    }
                }
                return Err(error);
            }
        }

        if let Some(duration) = timeout {
            self.schedule_timeout(filter_id, duration);
        }

        Ok(())
    }

    fn schedule_timeout(&self, filter_id: FilterId, duration: Duration) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut registry = manager.0.registry.lock().await;
            if let Some(mut filter) = registry.filters.shift_remove(&filter_id) {
                if let Some(completion) = filter.completion.take() {
                    log::debug!("Filter {filter_id} timed out with no match");
                    let _ = completion.send(Err(Error::Timeout));
                }
            }
        });
    }

    /// Runs the dispatch algorithm for one inbound frame: at most one
    /// one-shot filter, tried in insertion order, consumes it. Persistent
    /// subscription filters don't exclude one another, so two subscriptions
    /// on the same key both see every matching frame.
    async fn dispatch(&self, message: Message) {
        let mut registry = self.0.registry.lock().await;
        if registry.closed {
            return;
        }

        let order: Vec<FilterId> = registry.filters.keys().copied().collect();

        for filter_id in order {
            let Some(filter) = registry.filters.get_mut(&filter_id) else {
                continue;
            };

            if !(filter.consume)(&message) {
                continue;
            }

            if !filter.delete_after_first_consumed {
                // A persistent subscription matched: it already pushed the
                // result out as a side effect of `consume`. It never
                // self-removes, and it doesn't stop other filters (other
                // subscriptions in particular) from also seeing this frame.
                continue;
            }

            if let Some(mut removed) = registry.filters.shift_remove(&filter_id) {
                if let Some(completion) = removed.completion.take() {
                    let _ = completion.send(Ok(message));
                }
            }

            // Only one one-shot filter may consume a given frame.
            break;
        }
    }

    /// The cached peak height, updated only by the peak watcher filter.
    pub fn peak_height(&self) -> Option<u64> {
        match self.0.peak_height.load(Ordering::SeqCst) {
            NO_PEAK => None,
            height => Some(height),
        }
    }

    /// Closes the channel, fails every outstanding completion with
    /// `Cancelled`, and clears the registry.
    pub async fn close(&self) {
        let mut registry = self.0.registry.lock().await;
        if registry.closed {
            return;
        }
        registry.closed = true;

        for (_, mut filter) in registry.filters.drain(..) {
            if let Some(completion) = filter.completion.take() {
                let _ = completion.send(Err(Error::Cancelled));
            }
        }
        drop(registry);

        self.0.channel.close().await;
    }

    pub async fn is_closed(&self) -> bool {
        self.0.registry.lock().await.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coin, CoinState, RespondToPhUpdates};
    use async_trait::async_trait;
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc::Sender;

    /// An in-memory `MessageChannel` double: `send` is a no-op that records
    /// frames, and `push_inbound` feeds a frame straight to the registered
    /// sink, as if it had arrived over the wire.
    struct FakeChannel {
        sink: Mutex<Option<Sender<Bytes>>>,
        closed: std::sync::atomic::AtomicBool,
    }

    impl FakeChannel {
        fn new() -> Self {
            Self {
                sink: Mutex::new(None),
                closed: std::sync::atomic::AtomicBool::new(false),
            }
        }

        async fn push_inbound(&self, message: Message) {
            let sink = self.sink.lock().await.clone();
            if let Some(sink) = sink {
                let _ = sink.send(BincodeCodec::encode(&message).unwrap()).await;
            }
        }
    }

    #[async_trait]
    impl MessageChannel for FakeChannel {
        async fn open(&self) -> Result<()> {
            Ok(())
        }

        async fn send(&self, _frame: Bytes) -> Result<()> {
            Ok(())
        }

        fn on_message(&self, sink: Sender<Bytes>) {
            if let Ok(mut slot) = self.sink.try_lock() {
                *slot = Some(sink);
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn ph(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[tokio::test]
    async fn one_shot_filter_completes_on_match() {
        let channel = Arc::new(FakeChannel::new());
        let manager = MessageManager::new(channel.clone());
        manager.initialize().await.unwrap();

        let puzzle_hash = ph(1);
        let (filter, receiver) = Filter::one_shot(None, move |message: &Message| {
            if message.msg_type != ProtocolMessageTypes::RespondToPhUpdates {
                return false;
            }
            let Ok(response) = BincodeCodec::decode::<RespondToPhUpdates>(&message.data) else {
                return false;
            };
            response.puzzle_hashes.contains(&puzzle_hash)
        });
        manager.register_filter(filter).await.unwrap();

        let response = RespondToPhUpdates {
            puzzle_hashes: vec![puzzle_hash],
            min_height: 0,
            coin_states: vec![CoinState {
                coin: Coin::new(ph(9), puzzle_hash, 100),
                spent_height: None,
                created_height: Some(1),
            }],
        };
        channel
            .push_inbound(Message::new(
                ProtocolMessageTypes::RespondToPhUpdates,
                BincodeCodec::encode(&response).unwrap(),
            ))
            .await;

        let matched = receiver.await.unwrap().unwrap();
        assert_eq!(matched.msg_type, ProtocolMessageTypes::RespondToPhUpdates);
    }

    #[tokio::test]
    async fn only_the_first_matching_filter_consumes_a_frame() {
        let channel = Arc::new(FakeChannel::new());
        let manager = MessageManager::new(channel.clone());
        manager.initialize().await.unwrap();

        let (first, first_rx) =
            Filter::one_shot(None, |m: &Message| m.msg_type == ProtocolMessageTypes::RespondChildren);
        let (second, second_rx) =
            Filter::one_shot(None, |m: &Message| m.msg_type == ProtocolMessageTypes::RespondChildren);

        manager.register_filter(first).await.unwrap();
        manager.register_filter(second).await.unwrap();

        channel
            .push_inbound(Message::new(ProtocolMessageTypes::RespondChildren, Bytes::new()))
            .await;

        assert!(first_rx.await.is_ok());
        // The second filter never saw the frame consumed, and is still
        // pending until its own timeout.
        assert!(tokio::time::timeout(StdDuration::from_millis(50), second_rx)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn two_persistent_subscriptions_on_the_same_match_both_see_the_frame() {
        let channel = Arc::new(FakeChannel::new());
        let manager = MessageManager::new(channel.clone());
        manager.initialize().await.unwrap();

        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();

        let first = Filter::subscription(None, move |m: &Message| {
            if m.msg_type != ProtocolMessageTypes::RespondChildren {
                return false;
            }
            let _ = first_tx.send(());
            true
        });
        let second = Filter::subscription(None, move |m: &Message| {
            if m.msg_type != ProtocolMessageTypes::RespondChildren {
                return false;
            }
            let _ = second_tx.send(());
            true
        });

        manager.register_filter(first).await.unwrap();
        manager.register_filter(second).await.unwrap();

        channel
            .push_inbound(Message::new(ProtocolMessageTypes::RespondChildren, Bytes::new()))
            .await;

        assert!(first_rx.recv().await.is_some());
        assert!(second_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn timeout_fires_once_and_removes_the_filter() {
        let channel = Arc::new(FakeChannel::new());
        let manager = MessageManager::new(channel.clone());
        manager.initialize().await.unwrap();

        let (filter, receiver) = Filter::one_shot(None, |_: &Message| false);
        let filter = filter.with_timeout(StdDuration::from_millis(20));
        manager.register_filter(filter).await.unwrap();

        assert!(matches!(receiver.await.unwrap(), Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn close_cancels_all_pending_completions() {
        let channel = Arc::new(FakeChannel::new());
        let manager = MessageManager::new(channel.clone());
        manager.initialize().await.unwrap();

        let (filter, receiver) = Filter::one_shot(None, |_: &Message| false);
        manager.register_filter(filter).await.unwrap();

        manager.close().await;

        assert!(matches!(receiver.await.unwrap(), Err(Error::Cancelled)));
        assert!(manager.is_closed().await);
    }
}
