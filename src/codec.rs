use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Error, Result};

/// Binary (de)serialization of typed protocol payloads, kept behind a trait
/// so the bit-level Chia wire encoding (explicitly out of scope for this
/// adapter) can be swapped in without touching `MessageManager` or
/// `Provider`. The default `BincodeCodec` is a real, working stand-in used
/// by this crate's own tests and `WebSocketChannel`.
pub trait Codec<T> {
    fn encode(value: &T) -> Result<Bytes>;
    fn decode(bytes: &[u8]) -> Result<T>;
}

/// A `bincode`-backed `Codec<T>` over any serde-derived `WireMessage`.
/// `chia_protocol` uses a purpose-built `Streamable` trait for its canonical
/// byte layout; bincode plays the same structural role here without
/// reimplementing that canonical format, which is the external collaborator
/// this trait exists to delegate to.
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(value: &T) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(value)?))
    }

    fn decode(bytes: &[u8]) -> Result<T> {
        // Callers that need to attach a message type to a decode failure
        // (the dispatch loop) do so themselves via `Error::Decode`; this
        // generic path only has the raw bytes, so it reports via `Encode`.
        Ok(bincode::deserialize(bytes).map_err(Error::Encode)?)
    }
}
