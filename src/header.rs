use serde::{Deserialize, Serialize};

/// The trunk data every header block carries; only `height` is needed by
/// this adapter's predicates, but the rest travels with a real response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardChainBlock {
    pub height: u32,
    pub weight: u128,
}

/// A block header as carried over the wire, trimmed from
/// `chia_protocol::HeaderBlock` down to the fields this adapter's
/// operations and public `BlockHeader` translation actually need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub reward_chain_block: RewardChainBlock,
    pub header_hash: [u8; 32],
    pub prev_header_hash: [u8; 32],
    pub timestamp: Option<u64>,
}

impl HeaderBlock {
    pub fn height(&self) -> u32 {
        self.reward_chain_block.height
    }
}
