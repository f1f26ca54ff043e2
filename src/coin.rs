use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A UTXO: `(parent_coin_info, puzzle_hash, amount)`.
///
/// `coin_id` is grounded on `chia_protocol::Coin::coin_id`: the amount is
/// serialized as its minimal big-endian representation, with a leading zero
/// byte inserted whenever the high bit of the first remaining byte would
/// otherwise be mistaken for a sign bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_info: [u8; 32],
    pub puzzle_hash: [u8; 32],
    pub amount: u64,
}

impl Coin {
    pub fn new(parent_coin_info: [u8; 32], puzzle_hash: [u8; 32], amount: u64) -> Self {
        Self {
            parent_coin_info,
            puzzle_hash,
            amount,
        }
    }

    pub fn coin_id(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.parent_coin_info);
        hasher.update(self.puzzle_hash);
        hasher.update(canonical_amount_bytes(self.amount));
        hasher.finalize().into()
    }
}

/// The canonical (CLVM-atom-compatible) big-endian encoding of a coin amount.
fn canonical_amount_bytes(amount: u64) -> Vec<u8> {
    let full = amount.to_be_bytes();

    if amount >= 0x8000_0000_0000_0000 {
        let mut bytes = vec![0_u8];
        bytes.extend_from_slice(&full);
        return bytes;
    }

    let start = match amount {
        n if n >= 0x0080_0000_0000_0000 => 0,
        n if n >= 0x8000_0000_0000 => 1,
        n if n >= 0x0080_0000_0000 => 2,
        n if n >= 0x8000_0000 => 3,
        n if n >= 0x0080_0000 => 4,
        n if n >= 0x8000 => 5,
        n if n >= 0x80 => 6,
        n if n > 0 => 7,
        _ => 8,
    };
    full[start..].to_vec()
}

/// A coin together with the heights at which it was created and (if at all)
/// spent, as reported by the full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinState {
    pub coin: Coin,
    pub spent_height: Option<u32>,
    pub created_height: Option<u32>,
}
