use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use leaflet_client::{Codec as _, BincodeCodec, Message, MessageChannel, Result};
use tokio::sync::{mpsc, Mutex};

/// An in-memory `MessageChannel`: `send` is a no-op that records frames, and
/// `push_inbound` feeds an encoded `Message` straight to the registered
/// sink, as if it had arrived over the wire. Shared by the integration
/// tests in this directory instead of standing up a real WebSocket server.
pub struct FakeChannel {
    sink: Mutex<Option<mpsc::Sender<Bytes>>>,
    sent: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub async fn push_inbound(&self, message: Message) {
        let sink = self.sink.lock().await.clone();
        if let Some(sink) = sink {
            let _ = sink.send(BincodeCodec::encode(&message).unwrap()).await;
        }
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageChannel for FakeChannel {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, frame: Bytes) -> Result<()> {
        self.sent.lock().await.push(frame);
        Ok(())
    }

    fn on_message(&self, sink: mpsc::Sender<Bytes>) {
        if let Ok(mut slot) = self.sink.try_lock() {
            *slot = Some(sink);
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
