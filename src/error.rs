use crate::ProtocolMessageTypes;

/// Error taxonomy for the Leaflet adapter, per the error handling design:
/// validation failures coerce to `None` at most call sites rather than
/// reaching this enum, so what's left is mostly transport, timing, and
/// protocol-support failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("operation cancelled because the connection was closed")]
    Cancelled,

    #[error("operation is not supported by this provider")]
    UnsupportedOperation,

    #[error("failed to decode a message of type {0:?}")]
    Decode(ProtocolMessageTypes),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("failed to encode a protocol message: {0}")]
    Encode(#[from] bincode::Error),
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        // The only way a filter's completion sender is dropped without being
        // fired is `MessageManager::close`, which already failed every other
        // pending completion with this same variant.
        Error::Cancelled
    }
}

pub type Result<T> = std::result::Result<T, Error>;
