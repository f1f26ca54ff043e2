use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Coin, CoinState, HeaderBlock};

/// The closed enumeration of wallet-protocol message codes this adapter
/// understands. Unlike `chia_client`'s full-node `ProtocolMessageTypes`,
/// there is no request id carried alongside these — see `Message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolMessageTypes {
    Handshake,
    NewPeakWallet,
    RegisterForPhUpdates,
    RespondToPhUpdates,
    RegisterForCoinUpdates,
    RespondToCoinUpdates,
    CoinStateUpdate,
    RequestPuzzleSolution,
    RespondPuzzleSolution,
    RejectPuzzleSolution,
    RequestChildren,
    RespondChildren,
    RequestBlockHeader,
    RespondBlockHeader,
    RejectHeaderRequest,
    RequestHeaderBlocks,
    RespondHeaderBlocks,
    RejectHeaderBlocks,
    RequestRemovals,
    RespondRemovals,
    RejectRemovalsRequest,
    RequestAdditions,
    RespondAdditions,
    RejectAdditionsRequest,
}

/// A single framed protocol message. Per the wire protocol, there is no
/// correlation id here — `data` must disambiguate on its own, which is the
/// whole reason the `MessageManager`'s filter/predicate registry exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub msg_type: ProtocolMessageTypes,
    pub data: Bytes,
}

impl Message {
    pub fn new(msg_type: ProtocolMessageTypes, data: Bytes) -> Self {
        Self { msg_type, data }
    }
}

/// Binds a wire-protocol payload struct to its message type code, the way
/// `chia_protocol`'s `ChiaProtocolMessage` does for `T: Streamable +
/// ChiaProtocolMessage`. The byte-level encoding itself is delegated to
/// `Codec<T>` (see `codec.rs`), so this trait only carries the type tag.
pub trait WireMessage: Serialize + for<'de> Deserialize<'de> {
    fn msg_type() -> ProtocolMessageTypes;
}

/// Declares a wallet-protocol payload struct and its `WireMessage` binding,
/// mirroring `chia_protocol::message_struct!` but generating a plain Rust
/// struct with serde derives instead of a `Streamable` bit-level layout
/// (that layout is the externally-delegated `Codec<T>`'s problem).
macro_rules! protocol_message {
    ($name:ident { $( $field:ident : $ty:ty ),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $( pub $field: $ty, )*
        }

        impl WireMessage for $name {
            fn msg_type() -> ProtocolMessageTypes {
                ProtocolMessageTypes::$name
            }
        }
    };
}

protocol_message!(Handshake {
    network_id: String,
    protocol_version: String,
    software_version: String,
    node_type: u8,
    capabilities: Vec<(u16, String)>,
});

protocol_message!(NewPeakWallet {
    header_hash: [u8; 32],
    height: u32,
    weight: u128,
    fork_point_with_previous_peak: u32,
});

protocol_message!(RegisterForPhUpdates {
    puzzle_hashes: Vec<[u8; 32]>,
    min_height: u32,
});

protocol_message!(RespondToPhUpdates {
    puzzle_hashes: Vec<[u8; 32]>,
    min_height: u32,
    coin_states: Vec<CoinState>,
});

protocol_message!(RegisterForCoinUpdates {
    coin_ids: Vec<[u8; 32]>,
    min_height: u32,
});

protocol_message!(RespondToCoinUpdates {
    coin_ids: Vec<[u8; 32]>,
    min_height: u32,
    coin_states: Vec<CoinState>,
});

protocol_message!(CoinStateUpdate {
    height: u32,
    fork_height: u32,
    peak_hash: [u8; 32],
    items: Vec<CoinState>,
});

protocol_message!(RequestPuzzleSolution {
    coin_name: [u8; 32],
    height: u32,
});

protocol_message!(RespondPuzzleSolution {
    coin_name: [u8; 32],
    height: u32,
    puzzle_reveal: Bytes,
    solution: Bytes,
});

protocol_message!(RejectPuzzleSolution {
    coin_name: [u8; 32],
    height: u32,
});

protocol_message!(RequestChildren {
    coin_name: [u8; 32],
});

protocol_message!(RespondChildren {
    coin_states: Vec<CoinState>,
});

protocol_message!(RequestBlockHeader {
    height: u32,
});

protocol_message!(RespondBlockHeader {
    header_block: HeaderBlock,
});

protocol_message!(RejectHeaderRequest {
    height: u32,
});

protocol_message!(RequestHeaderBlocks {
    start_height: u32,
    end_height: u32,
});

protocol_message!(RespondHeaderBlocks {
    start_height: u32,
    end_height: u32,
    header_blocks: Vec<HeaderBlock>,
});

protocol_message!(RejectHeaderBlocks {
    start_height: u32,
    end_height: u32,
});

protocol_message!(RequestRemovals {
    height: u32,
    header_hash: [u8; 32],
    coin_names: Option<Vec<[u8; 32]>>,
});

protocol_message!(RespondRemovals {
    height: u32,
    header_hash: [u8; 32],
    coins: Vec<([u8; 32], Option<Coin>)>,
});

protocol_message!(RejectRemovalsRequest {
    height: u32,
    header_hash: [u8; 32],
});

protocol_message!(RequestAdditions {
    height: u32,
    header_hash: [u8; 32],
    puzzle_hashes: Option<Vec<[u8; 32]>>,
});

protocol_message!(RespondAdditions {
    height: u32,
    header_hash: [u8; 32],
    coins: Vec<([u8; 32], Vec<Coin>)>,
});

protocol_message!(RejectAdditionsRequest {
    height: u32,
    header_hash: [u8; 32],
});
