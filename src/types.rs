use bytes::Bytes;

/// The public view of a coin: `amount` is widened to `u128` here (the wire
/// `Coin` in `coin.rs` uses `u64`, matching the protocol's own encoding) so
/// a caller never has to think about overflow when summing balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    pub parent_coin_info: [u8; 32],
    pub puzzle_hash: [u8; 32],
    pub amount: u128,
}

impl From<crate::Coin> for Coin {
    fn from(coin: crate::Coin) -> Self {
        Self {
            parent_coin_info: coin.parent_coin_info,
            puzzle_hash: coin.puzzle_hash,
            amount: u128::from(coin.amount),
        }
    }
}

/// The public view of a coin's creation/spend status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinState {
    pub coin: Coin,
    pub spent_height: Option<u64>,
    pub created_height: Option<u64>,
}

impl From<crate::CoinState> for CoinState {
    fn from(state: crate::CoinState) -> Self {
        Self {
            coin: state.coin.into(),
            spent_height: state.spent_height.map(u64::from),
            created_height: state.created_height.map(u64::from),
        }
    }
}

/// The public view of a block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub header_hash: [u8; 32],
    pub prev_header_hash: [u8; 32],
    pub weight: u128,
    pub timestamp: Option<u64>,
}

impl From<crate::HeaderBlock> for BlockHeader {
    fn from(header: crate::HeaderBlock) -> Self {
        Self {
            height: u64::from(header.height()),
            header_hash: header.header_hash,
            prev_header_hash: header.prev_header_hash,
            weight: header.reward_chain_block.weight,
            timestamp: header.timestamp,
        }
    }
}

/// The public view of a puzzle reveal/solution pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleSolution {
    pub coin_name: [u8; 32],
    pub height: u64,
    pub puzzle_reveal: Bytes,
    pub solution: Bytes,
}
