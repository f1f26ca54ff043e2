use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use native_tls::TlsConnector;
use tokio::{
    net::TcpStream,
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use crate::{ClientConfig, Error, Result};

type WebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Sink = SplitSink<WebSocket, tungstenite::Message>;
type Stream = SplitStream<WebSocket>;

/// The full-duplex transport `MessageManager` drives. Byte framing and TLS
/// are this trait's problem, not `MessageManager`'s: frames are delivered
/// whole and in order, and `send` never blocks indefinitely.
///
/// Grounded on `chia_client::Peer`'s websocket handling, but narrowed to a
/// single inbound sink (rather than a `chia_client::Event` enum covering
/// peer-discovery concerns this adapter doesn't have).
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Establishes the transport and completes the protocol handshake.
    async fn open(&self) -> Result<()>;

    /// Enqueues a serialized frame.
    async fn send(&self, frame: Bytes) -> Result<()>;

    /// Registers the single inbound sink that receives complete frames, in
    /// arrival order. Must be called before `open`.
    fn on_message(&self, sink: mpsc::Sender<Bytes>);

    /// Idempotent shutdown; after this, no sinks are invoked and `send` fails.
    async fn close(&self);
}

struct ChannelInner {
    sink: Sink,
    inbound_handle: JoinHandle<()>,
}

/// A `MessageChannel` over a single TLS WebSocket connection to one full
/// node, the way `chia_client::Peer::connect` establishes a peer connection.
pub struct WebSocketChannel {
    uri: String,
    api_key: String,
    tls_connector: TlsConnector,
    inner: Mutex<Option<ChannelInner>>,
    sink_slot: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl WebSocketChannel {
    pub fn new(config: &ClientConfig, tls_connector: TlsConnector) -> Self {
        Self {
            uri: config.uri(),
            api_key: config.api_key.clone(),
            tls_connector,
            inner: Mutex::new(None),
            sink_slot: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MessageChannel for WebSocketChannel {
    async fn open(&self) -> Result<()> {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;

        let Some(sink_sender) = self.sink_slot.lock().await.clone() else {
            return Err(Error::Transport(
                "on_message must be registered before open".to_string(),
            ));
        };

        let mut request = self
            .uri
            .clone()
            .into_client_request()
            .map_err(|error| Error::Transport(error.to_string()))?;
        request
            .headers_mut()
            .insert("x-chia-api-key", self.api_key.parse().map_err(|_| {
                Error::Transport("api key is not a valid header value".to_string())
            })?);

        let (ws, _) = tokio_tungstenite::connect_async_tls_with_config(
            request,
            None,
            false,
            Some(Connector::NativeTls(self.tls_connector.clone())),
        )
        .await
        .map_err(|error| Error::Transport(error.to_string()))?;

        let (sink, stream) = ws.split();
        let inbound_handle = tokio::spawn(forward_inbound_messages(stream, sink_sender));

        *self.inner.lock().await = Some(ChannelInner {
            sink,
            inbound_handle,
        });

        Ok(())
    }

    async fn send(&self, frame: Bytes) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(channel) = inner.as_mut() else {
            return Err(Error::Transport("channel is not open".to_string()));
        };
        channel
            .sink
            .send(tungstenite::Message::Binary(frame.to_vec()))
            .await
            .map_err(Error::WebSocket)
    }

    fn on_message(&self, sink: mpsc::Sender<Bytes>) {
        // Synchronous registration is fine: this is only ever called once,
        // before `open`, from a single setup task.
        if let Ok(mut slot) = self.sink_slot.try_lock() {
            *slot = Some(sink);
        }
    }

    async fn close(&self) {
        if let Some(channel) = self.inner.lock().await.take() {
            channel.inbound_handle.abort();
        }
    }
}

async fn forward_inbound_messages(mut stream: Stream, sender: mpsc::Sender<Bytes>) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                log::warn!("Transport read error, closing inbound loop: {error}");
                break;
            }
        };

        match message {
            tungstenite::Message::Binary(data) => {
                if sender.send(Bytes::from(data)).await.is_err() {
                    break;
                }
            }
            tungstenite::Message::Close(frame) => {
                log::info!("Peer closed the connection: {frame:?}");
                break;
            }
            _ => {}
        }
    }
}
